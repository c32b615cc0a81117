/// Format a number of seconds as `H:MM:SS`.
///
/// Hours are not padded and have no upper bound; minutes and seconds are
/// always two digits. Negative values get a leading `-`.
pub fn format_time(seconds: i64) -> String {
    if seconds < 0 {
        return format!("-{}", format_time(seconds.saturating_neg()));
    }
    let s = seconds % 60;
    let minutes = seconds / 60;
    let m = minutes % 60;
    let h = minutes / 60;
    format!("{}:{:02}:{:02}", h, m, s)
}
