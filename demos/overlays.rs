//! Minimal end-to-end demo: write a small configuration tree to a temp
//! directory, then resolve a key through two overlays.
//!
//! Run with `cargo run --example overlays`.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("calque-demo");
    std::fs::create_dir_all(dir.join("prod"))?;
    std::fs::write(dir.join("values.yml"), "greeting: hello\nanswer: 1\n")?;
    std::fs::write(dir.join("prod").join("values.yml"), "answer: 42\n")?;

    let root = dir.to_str().ok_or("non-utf8 temp dir")?.to_owned();
    let config = calque::build(|c| {
        c.set_root(&root);
        c.define_overlay("default", None);
        c.define_overlay("environment", Some("prod"));
    })?;

    // `greeting` comes from the root file, `answer` from the prod overlay.
    let values = config.get("values")?;
    println!(
        "greeting = {:?}",
        values.get("greeting").and_then(|v| v.as_str())
    );
    println!(
        "answer   = {:?}",
        values.get("answer").and_then(|v| v.as_i64())
    );
    println!("{config:?}");
    Ok(())
}
