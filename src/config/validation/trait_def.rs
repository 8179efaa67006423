//! Validation trait definition

/// A configuration section that can check its own values
pub trait Validate {
    /// Section name used to prefix error messages
    const SECTION: &'static str;

    fn validate(&self) -> Result<(), String>;
}

/// Validate `section`, reporting failures as configuration errors
pub fn validate_section<T: Validate>(section: &T) -> crate::utils::error::Result<()> {
    section.validate().map_err(|e| {
        crate::utils::error::GuardError::config(format!("{} config error: {}", T::SECTION, e))
    })
}
