//! Stable per-trip display colors.

/// Colors a trip can be assigned, in palette order.
pub const PALETTE: [&str; 8] = [
    "#10b981", // emerald-500
    "#059669", // emerald-600
    "#047857", // emerald-700
    "#065f46", // emerald-800
    "#0d9488", // teal-600
    "#0f766e", // teal-700
    "#115e59", // teal-800
    "#134e4a", // teal-900
];

/// Maps an identifier to a palette entry.
///
/// The hash is `h = h * 31 + unit` over the UTF-16 code units of `id` with
/// 32-bit signed wraparound, so the result is the same on every platform and
/// matches colors assigned by earlier versions of the app. The empty string
/// maps to the first entry.
pub fn color_for(id: &str) -> &'static str {
    if id.is_empty() {
        return PALETTE[0];
    }

    let hash = id.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    });
    let index = hash.unsigned_abs() % PALETTE.len() as u32;

    PALETTE[index as usize]
}
