//! Trait for anything that can encrypt and decrypt through a transit engine

use async_trait::async_trait;

use crate::errors::TransitError;

#[async_trait]
pub trait TransitEncrypts: Send + Sync {
    /// Encrypt `plaintext` with the named key and return the service's ciphertext token
    ///
    /// # Arguments
    ///
    /// * `key_name` - The transit key to encrypt with
    /// * `plaintext` - The bytes to encrypt, may be empty
    /// * `context` - Optional key derivation context, must be supplied again on decrypt
    ///
    async fn encrypt(
        &self,
        key_name: &str,
        plaintext: &[u8],
        context: Option<&[u8]>,
    ) -> Result<String, TransitError>;

    /// Decrypt a ciphertext token previously returned by [`TransitEncrypts::encrypt`]
    async fn decrypt(
        &self,
        key_path: &str,
        ciphertext: &str,
        context: Option<&[u8]>,
    ) -> Result<Vec<u8>, TransitError>;
}

#[async_trait]
impl TransitEncrypts for Box<dyn TransitEncrypts> {
    async fn encrypt(
        &self,
        key_name: &str,
        plaintext: &[u8],
        context: Option<&[u8]>,
    ) -> Result<String, TransitError> {
        (**self).encrypt(key_name, plaintext, context).await
    }

    async fn decrypt(
        &self,
        key_path: &str,
        ciphertext: &str,
        context: Option<&[u8]>,
    ) -> Result<Vec<u8>, TransitError> {
        (**self).decrypt(key_path, ciphertext, context).await
    }
}
