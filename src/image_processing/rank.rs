use image::{ImageBuffer, Rgb, RgbImage};
use imageproc::filter::median_filter;

/// Order statistic picked from each square neighbourhood
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOp {
    Min,
    Median,
    Max,
    /// Most frequent value (seen more than twice); ties resolve to the smallest value
    Mode,
}

/// Replace every channel sample with a statistic of its `size x size` neighbourhood.
///
/// `size` is expected to be odd; callers validate it before dispatch.
/// Samples outside the image replicate the nearest edge pixel.
pub fn rank_filter(img: &RgbImage, op: RankOp, size: u32) -> RgbImage {
    let radius = size / 2;
    let (width, height) = img.dimensions();
    if radius == 0 || width == 0 || height == 0 {
        return img.clone();
    }

    match op {
        RankOp::Median => median_filter(img, radius, radius),
        RankOp::Min => fold_window(img, radius, |window| {
            window.iter().copied().min().unwrap_or_default()
        }),
        RankOp::Max => fold_window(img, radius, |window| {
            window.iter().copied().max().unwrap_or_default()
        }),
        RankOp::Mode => fold_window(img, radius, most_frequent),
    }
}

/// Gather each channel's neighbourhood into a buffer and reduce it with `reduce`.
fn fold_window<F>(img: &RgbImage, radius: u32, reduce: F) -> RgbImage
where
    F: Fn(&[u8]) -> u8,
{
    let (width, height) = img.dimensions();
    let radius = radius as i64;
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;
    let side = (2 * radius + 1) as usize;
    let mut window: [Vec<u8>; 3] = [
        Vec::with_capacity(side * side),
        Vec::with_capacity(side * side),
        Vec::with_capacity(side * side),
    ];

    ImageBuffer::from_fn(width, height, |x, y| {
        for channel in window.iter_mut() {
            channel.clear();
        }

        for dy in -radius..=radius {
            let sy = (y as i64 + dy).clamp(0, max_y) as u32;
            for dx in -radius..=radius {
                let sx = (x as i64 + dx).clamp(0, max_x) as u32;
                let sample = img.get_pixel(sx, sy);
                for (channel, value) in window.iter_mut().zip(sample.0.iter()) {
                    channel.push(*value);
                }
            }
        }

        Rgb([
            reduce(&window[0]),
            reduce(&window[1]),
            reduce(&window[2]),
        ])
    })
}

/// Most frequent value of the window, provided it occurs more than twice;
/// otherwise the centre sample is kept.
fn most_frequent(window: &[u8]) -> u8 {
    let mut histogram = [0u32; 256];
    for &value in window {
        histogram[value as usize] += 1;
    }

    let (best_value, best_count) = histogram
        .iter()
        .enumerate()
        .fold((0usize, 0u32), |best, (value, &count)| {
            if count > best.1 {
                (value, count)
            } else {
                best
            }
        });

    if best_count <= 2 {
        window[window.len() / 2]
    } else {
        best_value as u8
    }
}
