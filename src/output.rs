use std::collections::BTreeMap;
use std::io::Write;

/// What a command prints on standard output.
#[derive(Debug, PartialEq, Eq)]
pub enum Output {
    Count(usize),
    Value(String),
    Lines(Vec<String>),
    Map(BTreeMap<String, String>),
    Empty,
}

impl Output {
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        match self {
            Output::Count(count) => writeln!(out, "{count}"),
            Output::Value(value) => writeln!(out, "{value}"),
            Output::Lines(lines) => lines.iter().try_for_each(|line| writeln!(out, "{line}")),
            Output::Map(map) => map
                .iter()
                .try_for_each(|(key, value)| writeln!(out, "{key}: {value}")),
            Output::Empty => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(output: Output) -> String {
        let mut buffer = Vec::new();
        output.write_to(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn renders_each_shape() {
        assert_eq!(render(Output::Count(0)), "0\n");
        assert_eq!(render(Output::Value("d1".into())), "d1\n");
        assert_eq!(render(Output::Lines(vec!["a".into(), "b".into()])), "a\nb\n");
        assert_eq!(
            render(Output::Map(BTreeMap::from([
                ("web".into(), "2".into()),
                ("api".into(), "3".into()),
            ]))),
            "api: 3\nweb: 2\n"
        );
        assert_eq!(render(Output::Empty), "");
    }
}
