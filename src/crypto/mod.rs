pub mod signature;
#[cfg(test)]
pub mod wallet;
