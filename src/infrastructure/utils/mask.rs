/// Hides all but the last four characters of a contact identifier for logging.
pub fn mask_contact_id(contact_id: &str) -> String {
    let chars: Vec<char> = contact_id.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }

    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
