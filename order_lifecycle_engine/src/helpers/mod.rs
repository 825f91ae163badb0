mod validation;

pub use validation::{
    sanitize_notes,
    validate_new_order,
    validate_payment_request,
    validate_reason,
    ValidationError,
    MAX_NOTES_LEN,
    MAX_REASON_LEN,
};
