//! Display formatting for dashboard figures (Indian numbering).

/// Value in lakhs with one decimal: 1,150,000 -> `11.5L`.
pub fn lakhs(value: f64) -> String {
    format!("{:.1}L", value / 100_000.0)
}

/// Compact rupee amount: crores above 1e7, lakhs above 1e5, else grouped.
pub fn inr_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 10_000_000.0 {
        format!("₹{:.2}Cr", value / 10_000_000.0)
    } else if abs >= 100_000.0 {
        format!("₹{}", lakhs(value))
    } else {
        format!("₹{}", grouped(value))
    }
}

pub fn pct(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn signed_pct(value: f64) -> String {
    format!("{:+.1}%", value)
}

/// Rounded integer with thousands separators: 41000.4 -> `41,000`.
pub fn grouped(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

pub fn signed_grouped(value: f64) -> String {
    if value.round() > 0.0 {
        format!("+{}", grouped(value))
    } else {
        grouped(value)
    }
}
