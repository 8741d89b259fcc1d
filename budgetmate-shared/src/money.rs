/// Compact rupee formatting for messages and summaries
///
/// | Amount      | Output    |
/// |-------------|-----------|
/// | 250000      | `₹2.5L`   |
/// | 4600        | `₹5K`     |
/// | 1299.5      | `₹1K`     |
/// | 499         | `₹499`    |

const LAKH: f64 = 100_000.0;
const THOUSAND: f64 = 1_000.0;

/// Formats `amount` in lakhs, thousands, or whole rupees.
///
/// ```
/// use budgetmate_shared::money::format_inr;
///
/// assert_eq!(format_inr(150_000.0), "₹1.5L");
/// assert_eq!(format_inr(2_400.0), "₹2K");
/// assert_eq!(format_inr(999.0), "₹999");
/// ```
pub fn format_inr(amount: f64) -> String {
    if amount >= LAKH {
        format!("₹{:.1}L", amount / LAKH)
    } else if amount >= THOUSAND {
        format!("₹{:.0}K", amount / THOUSAND)
    } else {
        format!("₹{:.0}", amount)
    }
}
