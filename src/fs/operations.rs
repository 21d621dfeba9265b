use std::{io::ErrorKind, path::Path};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::debug;

/// Reads the whole file while holding a shared lock. A missing file reads as `None`.
pub async fn read_locked(path: &Path) -> Result<Option<String>, io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    file.lock_shared()?;
    let mut contents = String::new();
    let result = file.read_to_string(&mut contents).await;
    file.unlock_async().await?;
    result?;

    debug!("Read {} bytes from {path:?}", contents.len());
    Ok(Some(contents))
}

/// Replaces the contents of a file while holding an exclusive lock. The file is created if it
/// doesn't exist yet.
pub async fn replace_locked(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    if let Some(parent) = path.parent().filter(|v| !v.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = File::options()
        .write(true)
        .create(true)
        .read(true)
        .truncate(false)
        .open(path)
        .await?;

    // Truncation has to happen after the lock is taken, otherwise a reader may observe an
    // empty file.
    file.lock_exclusive()?;
    let result = overwrite(&mut file, contents).await;
    file.unlock_async().await?;
    result?;

    debug!("Wrote {} bytes into {path:?}", contents.len());
    Ok(())
}

async fn overwrite(file: &mut File, contents: &[u8]) -> Result<(), io::Error> {
    file.set_len(0).await?;
    file.rewind().await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_data().await
}
