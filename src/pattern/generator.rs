//! Build concrete paths from a template and parameter values.

use regex::Regex;

use super::error::PatternError;
use super::params::{ParamValue, PathParams};
use super::parser::{Modifier, ParamDescriptor, PatternSequence, Segment};

/// Generation behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Percent-encode every value before emitting it
    pub encode: bool,
    /// Check every emitted value against the parameter's pattern
    pub validate: bool,
    pub case_sensitive: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            encode: true,
            validate: true,
            case_sensitive: false,
        }
    }
}

#[derive(Debug, Clone)]
struct ParamPart {
    descriptor: ParamDescriptor,
    /// Pattern source quoted in validation errors
    pattern: String,
    validator: Option<Regex>,
}

#[derive(Debug, Clone)]
enum Part {
    Text(String),
    Param(Box<ParamPart>),
}

/// Compiled path generator for one template
#[derive(Debug, Clone)]
pub struct PathGenerator {
    template: String,
    parts: Vec<Part>,
    options: GenerateOptions,
}

impl PathGenerator {
    /// Parse a template and build a generator with default options
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let sequence = PatternSequence::parse(template)?;
        Self::new(&sequence, GenerateOptions::default())
    }

    pub fn new(sequence: &PatternSequence, options: GenerateOptions) -> Result<Self, PatternError> {
        let default_pattern = format!("[^{}]+?", regex::escape(&sequence.delimiter().to_string()));
        let flags = if options.case_sensitive { "" } else { "(?i)" };
        let mut parts = Vec::with_capacity(sequence.segments().len());

        for segment in sequence.segments() {
            match segment {
                Segment::Literal(text) => parts.push(Part::Text(text.clone())),
                Segment::Group { text, modifier } => match modifier {
                    Modifier::None | Modifier::OneOrMore => parts.push(Part::Text(text.clone())),
                    Modifier::Optional | Modifier::ZeroOrMore => {}
                },
                Segment::Param(param) => {
                    let pattern = param
                        .pattern
                        .clone()
                        .unwrap_or_else(|| default_pattern.clone());
                    let validator = if options.validate {
                        let source = format!("{flags}^(?:{pattern})$");
                        Some(
                            Regex::new(&source)
                                .map_err(|e| PatternError::invalid_regex(&source, &e))?,
                        )
                    } else {
                        None
                    };
                    parts.push(Part::Param(Box::new(ParamPart {
                        descriptor: param.clone(),
                        pattern,
                        validator,
                    })));
                }
            }
        }

        Ok(Self {
            template: sequence.template().to_string(),
            parts,
            options,
        })
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Produce the path for `params`.
    ///
    /// Values not named by the template are ignored.
    pub fn generate(&self, params: &PathParams) -> Result<String, PatternError> {
        let mut path = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => path.push_str(text),
                Part::Param(param) => self.emit(&mut path, param, params.get(&param.descriptor.name))?,
            }
        }
        Ok(path)
    }

    fn emit(
        &self,
        path: &mut String,
        part: &ParamPart,
        value: Option<&ParamValue>,
    ) -> Result<(), PatternError> {
        let param = &part.descriptor;
        let name = &*param.name;

        if param.modifier.is_repeated() {
            let values = match value {
                Some(ParamValue::Repeated(values)) => values,
                None if param.modifier.is_optional() => return Ok(()),
                _ => {
                    return Err(PatternError::value(
                        name,
                        format!("Expected \"{name}\" to be an array"),
                    ))
                }
            };
            if values.is_empty() {
                if param.modifier.is_optional() {
                    return Ok(());
                }
                return Err(PatternError::value(
                    name,
                    format!("Expected \"{name}\" to not be empty"),
                ));
            }
            let mut segments = Vec::with_capacity(values.len());
            for value in values {
                let segment = self.encode(value);
                self.validate(part, &segment, true)?;
                segments.push(segment);
            }
            path.push_str(&param.prefix);
            path.push_str(&segments.join(&param.separator));
            path.push_str(&param.suffix);
            return Ok(());
        }

        let value = match value {
            Some(ParamValue::Single(value)) => value,
            None if param.modifier.is_optional() => return Ok(()),
            _ => {
                return Err(PatternError::value(
                    name,
                    format!("Expected \"{name}\" to be a string"),
                ))
            }
        };
        let segment = self.encode(value);
        self.validate(part, &segment, false)?;
        path.push_str(&param.prefix);
        path.push_str(&segment);
        path.push_str(&param.suffix);
        Ok(())
    }

    fn encode(&self, value: &str) -> String {
        if self.options.encode {
            urlencoding::encode(value).into_owned()
        } else {
            value.to_string()
        }
    }

    fn validate(&self, part: &ParamPart, segment: &str, repeated: bool) -> Result<(), PatternError> {
        let Some(validator) = &part.validator else {
            return Ok(());
        };
        if validator.is_match(segment) {
            return Ok(());
        }
        let name = &*part.descriptor.name;
        let pattern = &part.pattern;
        let all = if repeated { "all " } else { "" };
        Err(PatternError::value(
            name,
            format!("Expected {all}\"{name}\" to match \"{pattern}\", but got \"{segment}\""),
        ))
    }
}
