use crate::{Output, OutputError, Result, Spinner};

/// Backend that prints nothing and cannot prompt.
pub struct Quiet;

impl Output for Quiet {
    fn message(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn heading(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn success(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn warn(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn fail(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Err(OutputError::Unsupported(
            "Cannot ask for confirmation in quiet mode",
        ))
    }

    fn select(&self, _prompt: &str, _options: &[String]) -> Result<usize> {
        Err(OutputError::Unsupported("Cannot offer a choice in quiet mode"))
    }

    fn input(&self, _prompt: &str) -> Result<String> {
        Err(OutputError::Unsupported("Cannot read input in quiet mode"))
    }

    fn spinner(&self, _msg: &str) -> Spinner {
        Spinner::hidden()
    }

    fn section(&self, _header: &str) -> Result<Box<dyn Output>> {
        Ok(Box::new(Self))
    }

    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_are_refused() {
        let err = Quiet.confirm("Delete?").unwrap_err();
        assert!(matches!(err, OutputError::Unsupported(_)));
        assert_eq!(err.to_string(), "Cannot ask for confirmation in quiet mode");

        let options = vec!["a".to_string()];
        assert!(matches!(
            Quiet.select("Pick", &options),
            Err(OutputError::Unsupported(_))
        ));
        assert!(matches!(
            Quiet.input("Which one?"),
            Err(OutputError::Unsupported(_))
        ));
    }

    #[test]
    fn spinner_and_sections_are_silent() {
        let spinner = Quiet.spinner("Fetching");
        assert!(spinner.is_hidden());
        spinner.finish();

        let section = Quiet.section("Header").unwrap();
        section.message("nested").unwrap();
    }
}
