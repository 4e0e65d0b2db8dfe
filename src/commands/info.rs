use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns server statistics in the `INFO` text format. Sections are accepted but every section
/// is always returned.
///
/// Ref: <https://redis.io/docs/latest/commands/info>
#[derive(Debug, PartialEq)]
pub struct Info {
    pub sections: Vec<String>,
}

impl Executable for Info {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        Ok(Frame::bulk(store.metrics().render()))
    }
}

impl TryFrom<&mut CommandParser> for Info {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut sections = vec![];
        while parser.has_next() {
            sections.push(parser.next_string()?.to_lowercase());
        }
        Ok(Self { sections })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::run;
    use crate::metrics::Category;

    #[test]
    fn renders_metrics() {
        let store = Store::default();
        store.metrics().record(Category::List);

        let Frame::Bulk(info) = run(&store, &["INFO", "commandstats"]) else {
            panic!("expected a bulk reply");
        };
        let info = String::from_utf8(info.to_vec()).unwrap();

        assert!(info.contains("cmdstat_list:calls=1"));
    }
}
