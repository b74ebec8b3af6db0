use super::Fault;
use crate::app::App;

/// One `key : value` line of a crash report.
pub trait ReportField {
    fn key(&self) -> &str;

    /// Generate the value at report time.
    fn value(&self, app: &dyn App, fault: &Fault) -> String;
}

/// A field whose value never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantField {
    key: String,
    value: String,
}

impl ConstantField {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl ReportField for ConstantField {
    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self, _app: &dyn App, _fault: &Fault) -> String {
        self.value.clone()
    }
}

/// A field computed from the app and the fault.
pub struct FnField<F> {
    key: String,
    generate: F,
}

impl<F> FnField<F>
where
    F: Fn(&dyn App, &Fault) -> String,
{
    pub fn new(key: impl Into<String>, generate: F) -> Self {
        Self {
            key: key.into(),
            generate,
        }
    }
}

impl<F> ReportField for FnField<F>
where
    F: Fn(&dyn App, &Fault) -> String,
{
    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self, app: &dyn App, fault: &Fault) -> String {
        (self.generate)(app, fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::sample_app;

    #[test]
    fn constant_field_ignores_inputs() {
        let field = ConstantField::new("Branch", "stable");
        let value = field.value(&sample_app(), &Fault::new("k", "m"));
        assert_eq!(field.key(), "Branch");
        assert_eq!(value, "stable");
    }

    #[test]
    fn fn_field_sees_app_and_fault() {
        let field = FnField::new("Summary", |app: &dyn App, fault: &Fault| {
            format!("{} hit {}", app.name(), fault.kind())
        });
        let value = field.value(&sample_app(), &Fault::new("overflow", "m"));
        assert_eq!(value, "Launcher hit overflow");
    }
}
