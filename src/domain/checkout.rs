//! Checkout form: customer identity, delivery, payment.
//!
//! Only validation errors are ever surfaced to the shopper; every label
//! mapping here is total so the formatter has no "unknown" fallback case.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOption {
    #[default]
    Pickup,
    Courier,
    Post,
}

impl DeliveryOption {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pickup => "Retirada no local",
            Self::Courier => "Entrega por motoboy",
            Self::Post => "Envio pelos Correios",
        }
    }

    pub fn requires_address(self) -> bool {
        !matches!(self, Self::Pickup)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Pix,
    Credit,
    Debit,
    Cash,
}

impl PaymentMethod {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pix => "Pix",
            Self::Credit => "Cartão de Crédito",
            Self::Debit => "Cartão de Débito",
            Self::Cash => "Dinheiro",
        }
    }
}

/// One checkout attempt. Address fields are required only when the
/// delivery option needs an address.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_delivery_address", skip_on_field_errors = false))]
pub struct CheckoutForm {
    #[validate(custom(function = "not_blank", message = "informe o nome"))]
    pub name: String,
    #[validate(custom(function = "not_blank", message = "informe o telefone"))]
    pub phone: String,
    pub delivery_option: DeliveryOption,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub complement: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub observation: String,
}

impl CheckoutForm {
    /// Fills address fields from a postal-code lookup. Empty fragment
    /// fields leave the shopper's input untouched.
    pub fn apply_address(&mut self, fragment: &AddressFragment) {
        if !fragment.street.is_empty() {
            self.street = fragment.street.clone();
        }
        if !fragment.neighborhood.is_empty() {
            self.neighborhood = fragment.neighborhood.clone();
        }
        if !fragment.city.is_empty() {
            self.city = fragment.city.clone();
        }
        if !fragment.state.is_empty() {
            self.state = fragment.state.clone();
        }
    }
}

/// Structured address fragment returned by the postal-code lookup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AddressFragment {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("obrigatorio"));
    }
    Ok(())
}

fn validate_delivery_address(form: &CheckoutForm) -> Result<(), ValidationError> {
    if !form.delivery_option.requires_address() {
        return Ok(());
    }
    let required = [
        ("rua", &form.street),
        ("número", &form.number),
        ("bairro", &form.neighborhood),
        ("cidade", &form.city),
        ("estado", &form.state),
        ("CEP", &form.postal_code),
    ];
    for (label, value) in required {
        if value.trim().is_empty() {
            let mut err = ValidationError::new("endereco_incompleto");
            err.message = Some(format!("informe o campo {label} do endereço").into());
            return Err(err);
        }
    }
    Ok(())
}

/// Flattens validator output into field-identifying messages, sorted so
/// the result is stable across runs.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut out = Vec::new();
    collect_messages(errors, &mut out);
    out.sort();
    out
}

fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err.message.as_deref().unwrap_or("inválido");
                    // Schema-level errors land under validator's internal
                    // "__all__" key; the message stands on its own.
                    if *field == "__all__" {
                        out.push(message.to_string());
                    } else {
                        out.push(format!("{field}: {message}"));
                    }
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, out),
            ValidationErrorsKind::List(map) => {
                for nested in map.values() {
                    collect_messages(nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pickup_form() -> CheckoutForm {
        CheckoutForm {
            name: "Maria".into(),
            phone: "11999990000".into(),
            delivery_option: DeliveryOption::Pickup,
            payment_method: PaymentMethod::Pix,
            ..CheckoutForm::default()
        }
    }

    #[test]
    fn pickup_needs_no_address() {
        assert!(pickup_form().validate().is_ok());
    }

    #[test]
    fn missing_name_and_phone_are_reported_by_field() {
        let form = CheckoutForm::default();
        let errors = form.validate().unwrap_err();
        let messages = validation_messages(&errors);
        assert!(messages.iter().any(|m| m.starts_with("name:")));
        assert!(messages.iter().any(|m| m.starts_with("phone:")));
    }

    #[test]
    fn courier_requires_full_address() {
        let form = CheckoutForm {
            delivery_option: DeliveryOption::Courier,
            street: "Rua Exemplo".into(),
            ..pickup_form()
        };
        let errors = form.validate().unwrap_err();
        let messages = validation_messages(&errors);
        assert!(messages.iter().any(|m| m.contains("número")));
    }

    #[test]
    fn whitespace_only_name_and_phone_are_rejected() {
        let form = CheckoutForm { name: "   ".into(), phone: "\t".into(), ..pickup_form() };
        let messages = validation_messages(&form.validate().unwrap_err());
        assert!(messages.iter().any(|m| m.starts_with("name:")));
        assert!(messages.iter().any(|m| m.starts_with("phone:")));
    }

    #[test]
    fn address_messages_carry_no_internal_field_key() {
        let form = CheckoutForm { delivery_option: DeliveryOption::Courier, ..pickup_form() };
        let messages = validation_messages(&form.validate().unwrap_err());
        assert!(messages.iter().any(|m| m.contains("endereço")));
        assert!(messages.iter().all(|m| !m.contains("__all__")));
    }

    #[test]
    fn courier_with_full_address_passes() {
        let form = CheckoutForm {
            delivery_option: DeliveryOption::Courier,
            street: "Rua Exemplo".into(),
            number: "123".into(),
            neighborhood: "Centro".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
            postal_code: "01001-000".into(),
            ..pickup_form()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn apply_address_overwrites_only_nonempty_fields() {
        let mut form = CheckoutForm {
            street: "Rua Antiga".into(),
            number: "42".into(),
            ..pickup_form()
        };
        form.apply_address(&AddressFragment {
            street: "Praça da Sé".into(),
            neighborhood: "Sé".into(),
            city: "São Paulo".into(),
            state: "".into(),
        });
        assert_eq!(form.street, "Praça da Sé");
        assert_eq!(form.neighborhood, "Sé");
        assert_eq!(form.number, "42");
        assert_eq!(form.state, "");
    }

    #[test]
    fn labels_cover_every_variant() {
        for option in [DeliveryOption::Pickup, DeliveryOption::Courier, DeliveryOption::Post] {
            assert!(!option.label().is_empty());
        }
        for method in [
            PaymentMethod::Pix,
            PaymentMethod::Credit,
            PaymentMethod::Debit,
            PaymentMethod::Cash,
        ] {
            assert!(!method.label().is_empty());
        }
    }
}
