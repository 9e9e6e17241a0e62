/// `1234` -> `"1,234 shells"`.
pub fn shells(price: u64) -> String {
    let digits = price.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped} shells")
}

/// Signed one-decimal percentage; positive values get an explicit `+`.
pub fn percentage(percent: f64) -> String {
    if percent > 0.0 {
        format!("+{percent:.1}%")
    } else {
        format!("{percent:.1}%")
    }
}
