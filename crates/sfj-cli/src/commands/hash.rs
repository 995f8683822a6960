use std::path::Path;

use sfj_core::ContentHasher;

pub fn hash(file: &Path) -> anyhow::Result<()> {
    let identity = ContentHasher::hash_file(file)?;
    println!("{identity}  {}", file.display());
    Ok(())
}
