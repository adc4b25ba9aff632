use keystash::{Store, WriteMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Creds {
    user: String,
    port: u16,
}

fn main() -> Result<(), keystash::Error> {
    env_logger::init();
    let path = std::env::temp_dir().join("keystash_example_builder.json");

    // pretty JSON, atomic replace, advisory lock, custom env var
    let stash = Store::builder()
        .pretty(true)
        .write_mode(WriteMode::Atomic)
        .advisory_lock(true)
        .env_var("KEYSTASH_EXAMPLE_FILE")
        .build()?;

    let resolved = stash.resolve(None);
    println!("without a path this would use {} ({})", resolved.path.display(), resolved.source);

    let file = Some(path.as_path());
    stash.put(
        "db",
        &Creds {
            user: "bob".into(),
            port: 3306,
        },
        file,
    )?;
    let creds: Option<Creds> = stash.get_as("db", file)?;
    println!("typed read: {creds:?}");

    let contents = std::fs::read_to_string(&path)?;
    println!("On-disk JSON:\n{contents}");
    println!("\nDebug output: {stash:?}");

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_file_name("keystash_example_builder.json.lock"));
    Ok(())
}
