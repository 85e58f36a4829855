pub mod decrypt;
pub mod fetch;
pub mod index;
pub mod keygen;
pub mod register;
pub mod status;
pub mod submit;

use std::io::Read;

use anyhow::Result;

/// `-` means stdin; anything else is taken literally.
pub fn read_arg_or_stdin(value: &str) -> Result<String> {
    if value == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer.trim_end_matches('\n').to_string())
    } else {
        Ok(value.to_string())
    }
}
