//! UI components and widgets.

mod help;
pub mod modals;

pub use help::HelpOverlay;

/// Format a byte size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Shorten `text` to `max` characters, keeping the end.
pub fn truncate_start(text: &str, max: usize) -> String {
    let len = text.chars().count();
    if len <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().skip(len - max).collect();
    }
    let tail: String = text.chars().skip(len - (max - 3)).collect();
    format!("...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(2048), "2 KiB");
    }

    #[test]
    fn test_truncate_start() {
        assert_eq!(truncate_start("plugins", 10), "plugins");
        assert_eq!(truncate_start("minecraft/plugins/Essentials.jar", 12), "...tials.jar");
    }
}
