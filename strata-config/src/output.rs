use std::str::FromStr;

use miette::{miette, Context as _, IntoDiagnostic as _};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Outputs(pub Vec<Output>);

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Output {
    #[knuffel(child)]
    pub off: bool,
    #[knuffel(argument)]
    pub name: String,
    #[knuffel(child, unwrap(argument, str))]
    pub mode: Option<Mode>,
}

/// Output size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub width: u16,
    pub height: u16,
}

impl FromIterator<Output> for Outputs {
    fn from_iter<T: IntoIterator<Item = Output>>(iter: T) -> Self {
        Self(Vec::from_iter(iter))
    }
}

impl Outputs {
    /// Finds an output by its connector name, case-insensitively.
    pub fn find(&self, name: &str) -> Option<&Output> {
        self.0.iter().find(|o| o.name.eq_ignore_ascii_case(name))
    }
}

impl FromStr for Mode {
    type Err = miette::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((width, height)) = s.split_once('x') else {
            return Err(miette!("no 'x' separator found"));
        };

        let width = width
            .parse()
            .into_diagnostic()
            .context("error parsing width")?;
        let height = height
            .parse()
            .into_diagnostic()
            .context("error parsing height")?;

        if width == 0 || height == 0 {
            return Err(miette!("mode size must be nonzero"));
        }

        Ok(Self { width, height })
    }
}
