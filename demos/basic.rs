use keystash::{Mutation, Store};
use serde_json::json;

fn main() -> Result<(), keystash::Error> {
    env_logger::init();
    let path = std::env::temp_dir().join("keystash_example_basic.json");
    let _ = std::fs::remove_file(&path);
    let stash = Store::new();
    let file = Some(path.as_path());

    // first set creates the file
    let written = stash.set("db:creds", json!({"user": "bob", "port": 3306}), file)?;
    println!("wrote {}", written.display());
    stash.set("api:token", json!("s3cr3t"), file)?;

    println!("db:creds  = {:?}", stash.get_value("db:creds", file)?);
    println!("missing   = {:?}", stash.get_value("nope", file)?);
    println!("keys      = {:?}", stash.keys(file)?);

    // overwrite, then delete
    stash.set("api:token", json!("rotated"), file)?;
    stash.set("api:token", Mutation::Remove, file)?;
    println!("after delete: keys = {:?}", stash.keys(file)?);

    let _ = std::fs::remove_file(&path);

    // reading a store that doesn't exist is an error, with directions
    if let Err(e) = stash.get(None, file) {
        println!("expected failure: {e}");
    }
    Ok(())
}
