/// Horizontal bar filled to `percent` of `width` cells
pub fn bar(percent: u32, width: u16) -> String {
    let width = width as usize;
    let filled = ((percent.min(100) as f64 / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled.min(width)))
}

/// Dotted track between two airports with the plane placed at `progress`
pub fn flight_path(progress: f64, width: u16) -> String {
    let width = width.max(1) as usize;
    let pos = ((progress.clamp(0.0, 1.0)) * (width - 1) as f64).round() as usize;

    (0..width)
        .map(|i| match i.cmp(&pos) {
            std::cmp::Ordering::Less => '━',
            std::cmp::Ordering::Equal => '✈',
            std::cmp::Ordering::Greater => '·',
        })
        .collect()
}
