//! Conversion fixtures
//!
//! Converts every `<name>.in.tf` in `tests/clu2adv/` and `tests/adv2v2/`. A fixture listed in the `errors.json` next
//! to it must fail with an error containing the listed text, all others must produce the configuration in
//! `<name>.out.tf`.
//!
//! Outputs are compared after parsing, formatting does not matter. Comments starting with `# ` in the expected
//! output must appear in the converted output as well. When input and expected output are identical the output
//! must be byte for byte the same.

use atlas_tf::ConvertError;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::path::Path;

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|err| panic!("{}: {err}", path.display()))
}

fn parse(name: &str, config: &str) -> hcl::Body {
    hcl::parse(config).unwrap_or_else(|err| panic!("{name}: invalid configuration: {err}\n{config}"))
}

fn fixture_name(path: &Path) -> String {
    let file_name = path.file_name().expect("fixture file").to_string_lossy();
    file_name.trim_end_matches(".in.tf").to_owned()
}

fn expected_errors(dir: &str) -> HashMap<String, String> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join(dir)
        .join("errors.json");
    serde_json::from_str(&read(&path)).expect("errors.json maps fixture names to error messages")
}

fn comments(config: &str) -> Vec<&str> {
    config
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("# "))
        .collect()
}

fn check<F>(path: &Path, errors: &HashMap<String, String>, convert: F)
where
    F: Fn(&str, &str) -> Result<String, ConvertError>,
{
    let name = fixture_name(path);
    let input = read(path);

    let output = match convert(&name, &input) {
        Ok(output) => output,
        Err(err) => {
            let expected = errors
                .get(&name)
                .unwrap_or_else(|| panic!("{name}: conversion failed: {err}"));
            assert!(
                err.to_string().contains(expected.as_str()),
                "{name}: `{err}` does not contain `{expected}`"
            );
            return;
        }
    };
    assert!(!errors.contains_key(&name), "{name}: conversion must fail");

    let expected = read(&path.with_file_name(format!("{name}.out.tf")));
    if expected == input {
        assert_eq!(output, input, "{name}");
        return;
    }

    assert_eq!(parse(&name, &output), parse(&name, &expected), "{name}");
    let output_comments = comments(&output);
    for comment in comments(&expected) {
        assert!(
            output_comments.contains(&comment),
            "{name}: comment `{comment}` missing in\n{output}"
        );
    }
}

#[test]
fn cluster_to_advanced_cluster() {
    let errors = expected_errors("clu2adv");

    insta::glob!("clu2adv/*.in.tf", |path| {
        check(path, &errors, |name, input| {
            atlas_tf::cluster_to_advanced_cluster(input, name.contains("moved"))
        });
    });
}

#[test]
fn advanced_cluster_to_v2() {
    let errors = expected_errors("adv2v2");

    insta::glob!("adv2v2/*.in.tf", |path| {
        check(path, &errors, |_, input| atlas_tf::advanced_cluster_to_v2(input));
    });
}
