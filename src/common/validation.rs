// src/common/validation.rs

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

pub const PASSWORD_SPECIAL_CHARACTERS: &str = "!@#$%&*()_+-=.,?;:";
pub const MAX_QUANTITY: i32 = 999_999_999;

// 999.999.999,99
pub fn max_price() -> Decimal {
    Decimal::new(99_999_999_999, 2)
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Monta um `ValidationErrors` com um único campo, para regras que só
/// podem ser checadas fora do derive (ex.: dependem do banco).
pub fn field_error(field: &'static str, code: &'static str, message: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, error(code, message));
    errors
}

// Nome de pessoa: letras (inclusive acentuadas), espaços, hífens e apóstrofos
pub fn validate_person_name(value: &str) -> Result<(), ValidationError> {
    let name = value.trim();
    let len = name.chars().count();
    if !(3..=50).contains(&len) {
        return Err(error("length", "O nome deve ter entre 3 e 50 caracteres."));
    }
    if !name
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '-' || c == '\'')
    {
        return Err(error(
            "characters",
            "O nome deve conter apenas letras, espaços, hífens e apóstrofos.",
        ));
    }
    if name.chars().filter(|c| c.is_alphabetic()).count() < 3 {
        return Err(error("letters", "O nome deve conter pelo menos 3 letras."));
    }
    Ok(())
}

pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if !(8..=32).contains(&len) {
        return Err(error("length", "A senha deve ter entre 8 e 32 caracteres."));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(error("whitespace", "A senha não pode conter espaços."));
    }
    if !value.chars().any(|c| c.is_lowercase()) {
        return Err(error("lowercase", "A senha deve conter pelo menos uma letra minúscula."));
    }
    if !value.chars().any(|c| c.is_uppercase()) {
        return Err(error("uppercase", "A senha deve conter pelo menos uma letra maiúscula."));
    }
    if value.chars().filter(|c| c.is_ascii_digit()).count() < 2 {
        return Err(error("digits", "A senha deve conter pelo menos dois números."));
    }
    if !value.chars().any(|c| PASSWORD_SPECIAL_CHARACTERS.contains(c)) {
        return Err(error(
            "special",
            "A senha deve conter pelo menos um caractere especial (!@#$%&*()_+-=.,?;:).",
        ));
    }
    Ok(())
}

// Nome de setor: letras, números, espaços, hífens e vírgulas, com ao menos uma letra
pub fn validate_sector_name(value: &str) -> Result<(), ValidationError> {
    let name = value.trim();
    let len = name.chars().count();
    if name.is_empty() {
        return Err(error("required", "O nome do setor é obrigatório."));
    }
    if !(3..=50).contains(&len) {
        return Err(error("length", "O nome do setor deve ter entre 3 e 50 caracteres."));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == ',')
    {
        return Err(error(
            "characters",
            "O nome do setor deve conter apenas letras, números, espaços, hífens e vírgulas.",
        ));
    }
    if !name.chars().any(char::is_alphabetic) {
        return Err(error("letters", "O nome do setor deve conter pelo menos uma letra."));
    }
    Ok(())
}

// Os limites valem para o texto já aparado, que é o que vai para o banco
pub fn validate_product_name(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if !(3..=150).contains(&len) {
        return Err(error("length", "O nome deve ter entre 3 e 150 caracteres."));
    }
    Ok(())
}

// Descrição em branco conta como ausente
pub fn validate_product_description(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len != 0 && !(3..=500).contains(&len) {
        return Err(error("length", "A descrição deve ter entre 3 e 500 caracteres."));
    }
    Ok(())
}

pub fn validate_price(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(error("range", "O preço não pode ser negativo."));
    }
    if *value > max_price() {
        return Err(error("range", "O preço não pode ser maior que 999.999.999,99."));
    }
    if value.normalize().scale() > 2 {
        return Err(error("scale", "O preço deve ter no máximo duas casas decimais."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn person_names() {
        assert!(validate_person_name("José D'Ávila-Souza").is_ok());
        assert!(validate_person_name("Ana").is_ok());
        assert!(validate_person_name("Al").is_err());
        assert!(validate_person_name("R2D2 Robô").is_err());
        assert!(validate_person_name("A - '").is_err());
        assert!(validate_person_name(&"a".repeat(51)).is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("Senha@12").is_ok());
        assert!(validate_password("Sen@12").is_err()); // curta
        assert!(validate_password("senha@12").is_err()); // sem maiúscula
        assert!(validate_password("SENHA@12").is_err()); // sem minúscula
        assert!(validate_password("Senha@1x").is_err()); // um dígito só
        assert!(validate_password("Senha123").is_err()); // sem especial
        assert!(validate_password("Senha @12").is_err()); // espaço
        assert!(validate_password(&format!("Aa@1{}", "1".repeat(29))).is_err());
    }

    #[test]
    fn password_error_codes_are_specific() {
        let err = validate_password("Senha@1x").unwrap_err();
        assert_eq!(err.code, "digits");
    }

    #[test]
    fn sector_names() {
        assert!(validate_sector_name("Vendas").is_ok());
        assert!(validate_sector_name("Setor 2, Norte-Sul").is_ok());
        assert!(validate_sector_name("   ").is_err());
        assert!(validate_sector_name("ab").is_err());
        assert!(validate_sector_name("123").is_err());
        assert!(validate_sector_name("Vendas!").is_err());
    }

    #[test]
    fn product_texts_are_measured_trimmed() {
        assert!(validate_product_name("Caneta").is_ok());
        assert!(validate_product_name("     ").is_err());
        assert!(validate_product_name("  ab  ").is_err());
        assert!(validate_product_name(&format!(" {} ", "a".repeat(150))).is_ok());
        assert!(validate_product_name(&"a".repeat(151)).is_err());

        assert!(validate_product_description("Caneta azul").is_ok());
        assert!(validate_product_description("   ").is_ok());
        assert!(validate_product_description("  ab  ").is_err());
        assert!(validate_product_description(&"a".repeat(501)).is_err());
    }

    #[test]
    fn prices() {
        assert!(validate_price(&Decimal::ZERO).is_ok());
        assert!(validate_price(&Decimal::from_str("10.50").unwrap()).is_ok());
        assert!(validate_price(&Decimal::from_str("999999999.99").unwrap()).is_ok());
        assert!(validate_price(&Decimal::from_str("1000000000").unwrap()).is_err());
        assert!(validate_price(&Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(validate_price(&Decimal::from_str("1.999").unwrap()).is_err());
    }

    #[test]
    fn field_error_is_keyed_by_field() {
        let errors = field_error("sectorIds", "required", "x");
        assert!(errors.field_errors().contains_key("sectorIds"));
    }
}
