/// Loader module
/// Turns a batch of header and script files into parsed labels
///
/// Submodules:
/// - expand: Text-level macro substitution
/// - loader: The three loading passes and per-file error isolation
/// - script: Loaded labels and statements
pub mod expand;
pub mod loader;
pub mod script;

#[cfg(test)]
mod tests;
