/*!
End-to-end tests for the engine: environment lifecycle, parsing,
command-wrapped mutation, splicing, synthetic resolution, and the
virtual runtime-image filesystem working together.
*/

use std::fs::{self, File};
use std::io::Write;

use zip::write::FileOptions;
use zip::ZipWriter;

use tracing_subscriber::EnvFilter;

use java_psi::splice::{self, Statements};
use java_psi::vfs::IMAGE_PATH;
use java_psi::{execute, Environment, ElementKind, JrtFileSystem, PsiFacade};

/// Routes engine traces to the test harness; `RUST_LOG` selects the level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fake_runtime_home(version: &str, files: &[(&str, &[u8])]) -> tempfile::TempDir {
    let home = tempfile::tempdir().unwrap();
    fs::create_dir_all(home.path().join("lib")).unwrap();
    fs::write(
        home.path().join("release"),
        format!("JAVA_VERSION=\"{version}\"\nOS_NAME=\"Linux\"\n"),
    )
    .unwrap();

    let image = File::create(home.path().join(IMAGE_PATH)).unwrap();
    let mut writer = ZipWriter::new(image);
    for (name, content) in files {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
    home
}

#[test]
fn parse_mutate_and_print_a_utility_class() {
    init_tracing();
    let env = Environment::new();
    env.setup();
    let project = env.project().unwrap();

    let file = project
        .parser()
        .parse("package acme;\n\npublic final class Util {\n}\n")
        .unwrap();

    execute(&project, || {
        let class = java_psi::top_level_class(&file)?;
        let factory = project.element_factory();
        let ctor = factory.create_private_constructor(&class, Some("Prevents instantiation."))?;
        let r_brace = class.r_brace().expect("a parsed class has braces");
        class.add_before(&ctor, &r_brace)?;
        Ok(())
    })
    .unwrap();

    let printed = file.text();
    assert!(printed.contains("/** Prevents instantiation. */"));
    assert!(printed.contains("private Util() {"));

    env.close();
    assert!(env.project().is_err());
}

#[test]
fn splice_statements_into_a_parsed_method() {
    init_tracing();
    let env = Environment::new();
    env.setup();
    let project = env.project().unwrap();
    let factory = project.element_factory();

    let file = project
        .parser()
        .parse("public class Job {\n    void run() {\n    }\n}\n")
        .unwrap();

    execute(&project, || {
        let class = java_psi::top_level_class(&file)?;
        let method = class
            .find_method("run")
            .ok_or_else(|| anyhow::anyhow!("no `run` method"))?;
        let body = method
            .children()
            .into_iter()
            .find(|child| child.kind() == ElementKind::CodeBlock)
            .ok_or_else(|| anyhow::anyhow!("no method body"))?;
        let statements = Statements::from_text(&factory, "\n        start();\n        stop();\n")?;
        splice::add(&body, &statements)?;
        Ok(())
    })
    .unwrap();

    let printed = file.text();
    assert!(printed.contains("start();\n        stop();"));
}

#[test]
fn failed_mutation_surfaces_to_the_caller() {
    init_tracing();
    let env = Environment::new();
    env.setup();
    let project = env.project().unwrap();

    let result = execute(&project, || anyhow::bail!("splice went wrong"));

    assert_eq!(result.unwrap_err().to_string(), "splice went wrong");
}

#[test]
fn synthetic_resolution_backfills_missing_types() {
    init_tracing();
    let facade = PsiFacade::new();

    let resolved = facade.find_class("com.acme.Settings").unwrap();
    assert!(resolved.is_synthetic());

    let nested = resolved.find_inner_class_by_name("Builder", true).unwrap();
    assert_eq!(nested.name(), Some("Builder"));
    let field = resolved.find_field_by_name("timeout", true).unwrap();
    assert_eq!(field.name(), Some("timeout"));

    let printed = resolved.element().text();
    assert!(printed.contains("public static class Builder"));
    assert!(printed.contains("long timeout;"));
}

#[test]
fn runtime_image_is_served_without_unpacking() {
    init_tracing();
    let home = fake_runtime_home(
        "17.0.1",
        &[
            ("java.base/java/lang/Object.class", b"bytecode" as &[u8]),
            ("java.base/java/lang/String.class", b"more bytecode" as &[u8]),
        ],
    );
    let fs = JrtFileSystem::new();
    let home_str = home.path().to_string_lossy();

    let object = fs
        .find_file_by_path(&format!("{home_str}!/java.base/java/lang/Object.class"))
        .unwrap();
    assert!(!object.is_directory());
    assert_eq!(object.contents_to_byte_array().unwrap(), b"bytecode");

    let lang = object.parent().unwrap();
    assert!(lang.is_directory());
    assert_eq!(lang.children().len(), 2);

    assert!(fs.find_file_by_path(&home_str).is_none());
}
