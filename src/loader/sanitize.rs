use regex::Regex;
use std::sync::LazyLock;

const MAX_REASON_CHARS: usize = 200;

// `com.example.SomeException: ` al inicio del mensaje
static EXCEPTION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_$][\w$]*\.)+[A-Za-z_$][\w$]*(?:Exception|Error):\s*")
        .expect("exception prefix pattern")
});

/// Deja solo una causa corta y legible de un error del resolver.
///
/// Se queda con la primera línea no vacía, quita nombres de clases de
/// excepción encadenados y corta a 200 caracteres.
pub fn friendlier_message(raw: &str) -> String {
    let mut line = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string();

    while let Some(found) = EXCEPTION_PREFIX.find(&line) {
        line = line[found.end()..].trim_start().to_string();
    }

    if line.chars().count() > MAX_REASON_CHARS {
        line = line.chars().take(MAX_REASON_CHARS).collect::<String>();
        line.push('…');
    }

    if line.is_empty() {
        "Error desconocido".to_string()
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strips_exception_chain_and_stack() {
        let raw = "com.sedmelluq.discord.lavaplayer.tools.FriendlyException: java.io.IOException: This video is unavailable\n\tat com.foo.Bar.baz(Bar.java:10)";

        assert_eq!(friendlier_message(raw), "This video is unavailable");
    }

    #[test]
    fn test_exception_prefix_pattern_matches_qualified_names() {
        assert!(EXCEPTION_PREFIX.is_match("java.io.IOException: boom"));
        assert!(!EXCEPTION_PREFIX.is_match("Video privado: no disponible"));
    }

    #[test]
    fn test_plain_reason_is_kept() {
        assert_eq!(friendlier_message("  Video privado  "), "Video privado");
    }

    #[test]
    fn test_long_and_empty_reasons() {
        let long = "x".repeat(500);
        let sanitized = friendlier_message(&long);
        assert_eq!(sanitized.chars().count(), MAX_REASON_CHARS + 1);

        assert_eq!(friendlier_message("\n \n"), "Error desconocido");
        assert_eq!(friendlier_message("java.lang.NullPointerException: "), "Error desconocido");
    }
}
