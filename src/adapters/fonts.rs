//! Font discovery for chart text.
//!
//! plotters draws text only through fonts registered at runtime. The first
//! usable font (configured path first, then common CJK-capable system fonts)
//! is registered once for the whole process.

use plotters::style::{FontStyle, register_font};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Family name every chart text style asks for.
pub const CHART_FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
    "/usr/share/fonts/wenquanyi/wqy-microhei/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Medium.ttc",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "C:\\Windows\\Fonts\\simhei.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
];

static REGISTERED: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Registers a chart font once; returns the font in use, if any.
///
/// Later calls return the first result regardless of `preferred`.
pub fn ensure_chart_font(preferred: Option<&Path>) -> Option<&'static Path> {
    REGISTERED
        .get_or_init(|| {
            let found = candidates(preferred).find_map(|path| try_register(&path).then_some(path));
            match &found {
                Some(path) => info!(font = %path.display(), "registered chart font"),
                None => warn!("no usable font found; charts will be drawn without text"),
            }
            found
        })
        .as_deref()
}

fn candidates(preferred: Option<&Path>) -> impl Iterator<Item = PathBuf> + '_ {
    preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from))
}

fn try_register(path: &Path) -> bool {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    // plotters keeps registered fonts for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(CHART_FONT_FAMILY, FontStyle::Normal, bytes) {
        Ok(()) => true,
        Err(_) => {
            debug!(font = %path.display(), "font rejected");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_font_is_tried_first() {
        let preferred = PathBuf::from("/opt/fonts/custom.ttf");
        let first = candidates(Some(&preferred)).next();
        assert_eq!(first, Some(preferred));
    }

    #[test]
    fn missing_font_file_is_not_registered() {
        assert!(!try_register(Path::new("/nonexistent/font.ttf")));
    }
}
