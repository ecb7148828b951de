//! `certload keygen`

use anyhow::Result;
use certload_crypto::KeyMaterial;

pub fn run() -> Result<()> {
    let key = KeyMaterial::generate()?;
    println!("public key:  {}", key.public_key_base64());
    println!("fingerprint: {}", key.fingerprint());
    Ok(())
}
