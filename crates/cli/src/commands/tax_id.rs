//! Offline tax id validation.

use perim_core::types::tax_id::{self, TaxId, TaxIdError};

/// Check a CPF and report whether it is valid and canonically formatted.
///
/// # Errors
///
/// Returns the validation error when the check digits or length are wrong.
pub fn check(value: &str) -> Result<(), TaxIdError> {
    tax_id::check(value)?;

    let verdict = if TaxId::parse(value).is_ok() {
        "valid"
    } else {
        "valid digits, store it as XXX.XXX.XXX-XX"
    };

    #[allow(clippy::print_stdout)]
    {
        println!("{value}: {verdict}");
    }
    Ok(())
}
