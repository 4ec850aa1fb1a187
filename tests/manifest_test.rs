//! Tests for requirement manifest parsing

use rstest::rstest;

use rice_setup::domain::{Manifest, ManifestLine};

#[rstest]
#[case("requests", "requests")]
#[case("python-telegram-bot[job-queue]>=20.0", "python-telegram-bot")]
#[case("numpy >= 1.26, < 2", "numpy")]
#[case("Shapely~=2.0", "Shapely")]
#[case("google-api-python-client!=2.0.0", "google-api-python-client")]
#[case("pywin32; sys_platform == 'win32'", "pywin32")]
#[case("mypkg @ https://example.com/mypkg-1.0.tar.gz", "mypkg")]
#[case("zope.interface==6.1", "zope.interface")]
fn given_specifier_when_parse_then_extracts_name(#[case] line: &str, #[case] name: &str) {
    let manifest = Manifest::parse(line).unwrap();

    assert_eq!(manifest.names(), vec![name]);
    let spec = &manifest.requirements().next().unwrap().spec;
    assert_eq!(spec, line);
}

#[rstest]
#[case("-r base.txt")]
#[case("--index-url https://pypi.org/simple")]
fn given_option_line_when_parse_then_classified_as_option(#[case] line: &str) {
    let manifest = Manifest::parse(line).unwrap();

    assert_eq!(manifest.lines, vec![ManifestLine::Option(line.to_string())]);
    assert!(manifest.is_empty());
}

#[rstest]
#[case("-e .", ".")]
#[case("-e ./vendor/scoring", "./vendor/scoring")]
#[case("--editable git+https://github.com/org/repo.git#egg=repo", "git+https://github.com/org/repo.git#egg=repo")]
#[case("--editable=./pkg", "./pkg")]
fn given_editable_line_when_parse_then_counted_as_entry(#[case] line: &str, #[case] target: &str) {
    let manifest = Manifest::parse(line).unwrap();

    assert_eq!(manifest.lines, vec![ManifestLine::Editable(target.to_string())]);
    assert_eq!(manifest.entry_count(), 1);
    assert!(manifest.names().is_empty());
}

#[rstest]
#[case("./vendor/geo_utils")]
#[case("https://example.com/pkg-1.0-py3-none-any.whl")]
#[case("git+https://github.com/org/repo.git")]
fn given_url_or_path_when_parse_then_counted_as_other(#[case] line: &str) {
    let manifest = Manifest::parse(line).unwrap();

    assert_eq!(manifest.lines, vec![ManifestLine::Other(line.to_string())]);
    assert_eq!(manifest.entry_count(), 1);
    assert!(manifest.names().is_empty());
}

#[test]
fn given_realistic_manifest_when_parse_then_skips_comments_and_blanks() {
    let content = r#"
# Telegram bot
python-telegram-bot==20.7

python-dotenv>=1.0   # loads BOT_TOKEN
--extra-index-url https://mirror.example/simple
-e ./vendor/scoring

# Google Drive upload
google-api-python-client
google-auth-oauthlib \
    >=1.0
"#;

    let manifest = Manifest::parse(content).unwrap();

    assert_eq!(
        manifest.names(),
        vec![
            "python-telegram-bot",
            "python-dotenv",
            "google-api-python-client",
            "google-auth-oauthlib"
        ]
    );
    assert_eq!(manifest.entry_count(), 5);
    assert_eq!(manifest.lines.len(), 6);
}

#[test]
fn given_empty_content_when_parse_then_empty_manifest() {
    let manifest = Manifest::parse("\n  \n# nothing to install\n").unwrap();

    assert!(manifest.is_empty());
    assert!(manifest.lines.is_empty());
}
