//! Checkout message rendering.
//!
//! Pure input/output: the same cart, form, and total always produce a
//! byte-identical message. Section order is fixed; conditional sections
//! (address, observations) are omitted entirely rather than left blank.

use rust_decimal::Decimal;
use url::Url;

use crate::domain::cart::CartItem;
use crate::domain::checkout::CheckoutForm;
use crate::domain::value_objects::{CurrencyFormat, PostalCode};

/// Renders the order summary handed to the store over WhatsApp.
///
/// Precondition: `items` is non-empty. The caller rejects empty carts
/// before checkout ever reaches this point.
pub fn build_order_message(
    items: &[CartItem],
    form: &CheckoutForm,
    total: Decimal,
    currency: &CurrencyFormat,
) -> String {
    debug_assert!(!items.is_empty());

    let mut out = String::new();
    out.push_str("🛒 *Novo Pedido!*\n\n");
    out.push_str(&format!("*Cliente:* {}\n", form.name));
    out.push_str(&format!("*Telefone:* {}\n\n", form.phone));

    out.push_str("*Itens:*\n");
    for item in items {
        out.push_str(&format!(
            "{}x {} ({}) - Subtotal: {}\n",
            item.quantity,
            item.name,
            currency.format(item.price),
            currency.format(item.subtotal()),
        ));
    }
    out.push_str(&format!("\n*Total Geral: {}*\n", currency.format(total)));

    if form.delivery_option.requires_address() {
        out.push_str("\n*Endereço de Entrega:*\n");
        out.push_str(&format!("Rua: {}\n", form.street));
        out.push_str(&format!("Número: {}\n", form.number));
        if !form.complement.is_empty() {
            out.push_str(&format!("Complemento: {}\n", form.complement));
        }
        out.push_str(&format!("Bairro: {}\n", form.neighborhood));
        out.push_str(&format!("Cidade: {}\n", form.city));
        out.push_str(&format!("Estado: {}\n", form.state));
        // Canonical 01001-000 rendering when the field parses as a CEP,
        // the shopper's input verbatim otherwise.
        let cep = PostalCode::new(&form.postal_code)
            .map(|c| c.formatted())
            .unwrap_or_else(|_| form.postal_code.clone());
        out.push_str(&format!("CEP: {cep}\n"));
    }

    out.push_str(&format!("\n*Entrega:* {}\n", form.delivery_option.label()));
    out.push_str(&format!("*Pagamento:* {}\n", form.payment_method.label()));

    if !form.observation.is_empty() {
        out.push_str(&format!("\n*Observações:*\n{}\n", form.observation));
    }

    out
}

/// Builds the `wa.me` deep link carrying the message. Anything that is
/// not a digit in the handle (spaces, "+", punctuation) is dropped.
pub fn whatsapp_link(handle: &str, message: &str) -> Option<Url> {
    let digits: String = handle.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let mut url = Url::parse(&format!("https://wa.me/{digits}")).ok()?;
    url.query_pairs_mut().append_pair("text", message);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checkout::{DeliveryOption, PaymentMethod};
    use std::collections::BTreeMap;

    fn shirt_cart() -> Vec<CartItem> {
        vec![CartItem {
            id: "a".into(),
            name: "Shirt".into(),
            price: "29.90".parse().unwrap(),
            quantity: 2,
            selected_variants: BTreeMap::new(),
        }]
    }

    fn pickup_form() -> CheckoutForm {
        CheckoutForm {
            name: "Maria".into(),
            phone: "11999990000".into(),
            delivery_option: DeliveryOption::Pickup,
            payment_method: PaymentMethod::Pix,
            ..CheckoutForm::default()
        }
    }

    fn courier_form() -> CheckoutForm {
        CheckoutForm {
            delivery_option: DeliveryOption::Courier,
            street: "Rua Exemplo".into(),
            number: "123".into(),
            neighborhood: "Centro".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
            postal_code: "01001-000".into(),
            ..pickup_form()
        }
    }

    #[test]
    fn pickup_reference_message() {
        let msg = build_order_message(
            &shirt_cart(),
            &pickup_form(),
            "59.80".parse().unwrap(),
            &CurrencyFormat::default(),
        );
        assert!(msg.contains("2x Shirt (R$ 29,90) - Subtotal: R$ 59,80"));
        assert!(msg.contains("Total Geral: R$ 59,80"));
        assert!(!msg.contains("Endereço"));
        assert!(!msg.contains("Observações"));
        assert!(msg.contains("*Entrega:* Retirada no local"));
        assert!(msg.contains("*Pagamento:* Pix"));
    }

    #[test]
    fn output_is_deterministic() {
        let total: Decimal = "59.80".parse().unwrap();
        let fmt = CurrencyFormat::default();
        let a = build_order_message(&shirt_cart(), &courier_form(), total, &fmt);
        let b = build_order_message(&shirt_cart(), &courier_form(), total, &fmt);
        assert_eq!(a, b);
    }

    #[test]
    fn grand_total_equals_sum_of_subtotal_lines() {
        let items = vec![
            CartItem {
                id: "a".into(),
                name: "Shirt".into(),
                price: "29.90".parse().unwrap(),
                quantity: 2,
                selected_variants: BTreeMap::new(),
            },
            CartItem {
                id: "b".into(),
                name: "Mug".into(),
                price: "12.35".parse().unwrap(),
                quantity: 3,
                selected_variants: BTreeMap::new(),
            },
        ];
        let total: Decimal = items
            .iter()
            .fold(Decimal::ZERO, |acc, i| acc + i.subtotal());
        let msg = build_order_message(&items, &pickup_form(), total, &CurrencyFormat::default());
        assert!(msg.contains("Subtotal: R$ 59,80"));
        assert!(msg.contains("Subtotal: R$ 37,05"));
        assert!(msg.contains("Total Geral: R$ 96,85"));
    }

    #[test]
    fn item_lines_follow_cart_order() {
        let mut items = shirt_cart();
        items.push(CartItem {
            id: "b".into(),
            name: "Aardvark Figurine".into(),
            price: "5.00".parse().unwrap(),
            quantity: 1,
            selected_variants: BTreeMap::new(),
        });
        let msg = build_order_message(
            &items,
            &pickup_form(),
            "64.80".parse().unwrap(),
            &CurrencyFormat::default(),
        );
        let shirt = msg.find("2x Shirt").unwrap();
        let figurine = msg.find("1x Aardvark Figurine").unwrap();
        assert!(shirt < figurine);
    }

    #[test]
    fn courier_message_includes_address_block() {
        let msg = build_order_message(
            &shirt_cart(),
            &courier_form(),
            "59.80".parse().unwrap(),
            &CurrencyFormat::default(),
        );
        assert!(msg.contains("*Endereço de Entrega:*"));
        assert!(msg.contains("Rua: Rua Exemplo"));
        assert!(msg.contains("Número: 123"));
        assert!(msg.contains("CEP: 01001-000"));
        assert!(!msg.contains("Complemento:"));
    }

    #[test]
    fn cep_line_uses_canonical_format_for_bare_digits() {
        let form = CheckoutForm { postal_code: "01001000".into(), ..courier_form() };
        let msg = build_order_message(
            &shirt_cart(),
            &form,
            "59.80".parse().unwrap(),
            &CurrencyFormat::default(),
        );
        assert!(msg.contains("CEP: 01001-000"));
    }

    #[test]
    fn complement_line_appears_exactly_once_when_set() {
        let form = CheckoutForm { complement: "Ap 42".into(), ..courier_form() };
        let msg = build_order_message(
            &shirt_cart(),
            &form,
            "59.80".parse().unwrap(),
            &CurrencyFormat::default(),
        );
        assert_eq!(msg.matches("Complemento:").count(), 1);
        assert!(msg.contains("Complemento: Ap 42"));
    }

    #[test]
    fn observation_block_only_when_nonempty() {
        let form = CheckoutForm { observation: "sem cebola".into(), ..pickup_form() };
        let msg = build_order_message(
            &shirt_cart(),
            &form,
            "59.80".parse().unwrap(),
            &CurrencyFormat::default(),
        );
        assert!(msg.contains("*Observações:*\nsem cebola"));
    }

    #[test]
    fn whatsapp_link_encodes_message_and_strips_handle() {
        let url = whatsapp_link("+55 (11) 99999-0000", "Total Geral: R$ 59,80").unwrap();
        assert_eq!(url.host_str(), Some("wa.me"));
        assert_eq!(url.path(), "/5511999990000");
        let text: String = url
            .query_pairs()
            .find(|(k, _)| k == "text")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(text, "Total Geral: R$ 59,80");
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn whatsapp_link_requires_digits() {
        assert!(whatsapp_link("not-a-number", "oi").is_none());
    }
}
