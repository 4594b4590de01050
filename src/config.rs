//! Mount configuration.

use core::str::FromStr;
use thiserror::Error;
use wasm_bindgen::JsValue;

/// How the list reaches the DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
	/// Every item is re-rendered and diffed on each hover change.
	Plain,
	/// Items are wrapped in [`lignin::Node::Memoized`], so unchanged items are skipped by the differ.
	Memoized,
	/// No VDOM. Only the affected elements are restyled.
	Direct,
}
impl Variant {
	#[must_use]
	pub fn name(self) -> &'static str {
		match self {
			Variant::Plain => "plain",
			Variant::Memoized => "memoized",
			Variant::Direct => "direct",
		}
	}
}
impl FromStr for Variant {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		[Variant::Plain, Variant::Memoized, Variant::Direct]
			.iter()
			.copied()
			.find(|variant| variant.name().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| ConfigError::UnknownVariant(s.to_owned()))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
	#[error("Unknown variant {0:?}. Expected one of \"plain\", \"memoized\" or \"direct\".")]
	UnknownVariant(String),

	#[error("The list must contain at least one item.")]
	Empty,

	#[error("Depth limit {0} is too low to render list items (minimum 3).")]
	DepthLimit(usize),

	#[error("Highlight colour must not be empty or contain ';'.")]
	HighlightColor,
}
impl From<ConfigError> for JsValue {
	fn from(error: ConfigError) -> Self {
		JsValue::from_str(&error.to_string())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListConfig {
	pub item_count: u32,
	pub variant: Variant,
	pub highlight_color: String,
	/// Recursion limit for the differ. Items are three levels deep when memoized.
	pub depth_limit: usize,
}
impl Default for ListConfig {
	fn default() -> Self {
		Self {
			item_count: 500,
			variant: Variant::Memoized,
			highlight_color: "lightblue".to_owned(),
			depth_limit: 8,
		}
	}
}
impl ListConfig {
	pub const MIN_DEPTH_LIMIT: usize = 3;

	#[must_use]
	pub fn item_count(mut self, item_count: u32) -> Self {
		self.item_count = item_count;
		self
	}

	#[must_use]
	pub fn variant(mut self, variant: Variant) -> Self {
		self.variant = variant;
		self
	}

	#[must_use]
	pub fn highlight_color(mut self, highlight_color: impl Into<String>) -> Self {
		self.highlight_color = highlight_color.into();
		self
	}

	#[must_use]
	pub fn depth_limit(mut self, depth_limit: usize) -> Self {
		self.depth_limit = depth_limit;
		self
	}

	/// # Errors
	///
	/// Iff a field is out of range.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.item_count == 0 {
			return Err(ConfigError::Empty);
		}
		if self.depth_limit < Self::MIN_DEPTH_LIMIT {
			return Err(ConfigError::DepthLimit(self.depth_limit));
		}
		if self.highlight_color.trim().is_empty() || self.highlight_color.contains(';') {
			return Err(ConfigError::HighlightColor);
		}
		Ok(())
	}

	/// The `style` attribute value of a highlighted item.
	#[must_use]
	pub fn highlight_style(&self) -> String {
		format!("background-color: {}", self.highlight_color.trim())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_valid() {
		let config = ListConfig::default();
		assert_eq!(config.item_count, 500);
		assert_eq!(config.validate(), Ok(()));
		assert_eq!(config.highlight_style(), "background-color: lightblue");
	}

	#[test]
	fn parse_variants() {
		assert_eq!("plain".parse(), Ok(Variant::Plain));
		assert_eq!(" Memoized ".parse(), Ok(Variant::Memoized));
		assert_eq!("DIRECT".parse(), Ok(Variant::Direct));
		assert_eq!("memo".parse::<Variant>(), Err(ConfigError::UnknownVariant("memo".to_owned())));
	}

	#[test]
	fn rejects_out_of_range() {
		assert_eq!(ListConfig::default().item_count(0).validate(), Err(ConfigError::Empty));
		assert_eq!(ListConfig::default().depth_limit(2).validate(), Err(ConfigError::DepthLimit(2)));
		assert_eq!(ListConfig::default().highlight_color("red; color: red").validate(), Err(ConfigError::HighlightColor));
	}
}
