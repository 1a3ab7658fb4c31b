//! Replayable selection command log

use std::fmt;

use glam::Vec3;

use crate::item::SelectionItem;

/// One replayable selection command
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayLine {
    Add {
        document: String,
        object: String,
        sub_name: String,
        position: Vec3,
        keep_preselect: bool,
    },
    AddMany {
        document: String,
        object: String,
        sub_names: Vec<String>,
    },
    Remove {
        document: String,
        object: String,
        sub_name: String,
    },
    Clear {
        document: Option<String>,
        keep_preselect: bool,
    },
}

impl ReplayLine {
    /// Line recording the addition or removal of `item`
    pub fn for_item(item: &SelectionItem, remove: bool, clear_preselect: bool) -> Self {
        let sub_name = item.old_style_sub_name();
        if remove {
            Self::Remove {
                document: item.document.clone(),
                object: item.object.clone(),
                sub_name,
            }
        } else {
            Self::Add {
                document: item.document.clone(),
                object: item.object.clone(),
                sub_name,
                position: item.position,
                keep_preselect: !clear_preselect,
            }
        }
    }
}

impl fmt::Display for ReplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add {
                document,
                object,
                sub_name,
                position,
                keep_preselect,
            } => {
                write!(f, "selection.add({:?}, {:?}", document, object)?;
                let with_extras = *position != Vec3::ZERO || *keep_preselect;
                if !sub_name.is_empty() || with_extras {
                    write!(f, ", {:?}", sub_name)?;
                }
                if with_extras {
                    write!(f, ", {}, {}, {}", position.x, position.y, position.z)?;
                }
                if *keep_preselect {
                    write!(f, ", false")?;
                }
                write!(f, ")")
            }
            Self::AddMany {
                document,
                object,
                sub_names,
            } => {
                write!(f, "selection.add({:?}, {:?}, [", document, object)?;
                for (i, sub) in sub_names.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", sub)?;
                }
                write!(f, "])")
            }
            Self::Remove {
                document,
                object,
                sub_name,
            } => {
                write!(f, "selection.remove({:?}, {:?}", document, object)?;
                if !sub_name.is_empty() {
                    write!(f, ", {:?}", sub_name)?;
                }
                write!(f, ")")
            }
            Self::Clear {
                document,
                keep_preselect,
            } => {
                write!(f, "selection.clear(")?;
                if let Some(document) = document {
                    write!(f, "{:?}", document)?;
                    if *keep_preselect {
                        write!(f, ", ")?;
                    }
                }
                if *keep_preselect {
                    write!(f, "false")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Sink for replay lines
pub trait CommandLog: Send {
    fn add_line(&mut self, line: &ReplayLine);
}

/// Writes replay lines to the tracing output
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCommandLog;

impl CommandLog for TracingCommandLog {
    fn add_line(&mut self, line: &ReplayLine) {
        tracing::info!(target: "rk_selection::replay", "{}", line);
    }
}

/// Nesting state of command log suppression
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogSuppression {
    pub depth: u32,
    /// Whether a selection existed when suppression began
    pub had_selection: bool,
}

impl LogSuppression {
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }
}

/// Write the line for `item` unless an add was already logged
pub(crate) fn log_item(
    log: &mut dyn CommandLog,
    item: &mut SelectionItem,
    remove: bool,
    clear_preselect: bool,
) {
    if item.logged && !remove {
        return;
    }
    item.logged = true;
    log.add_line(&ReplayLine::for_item(item, remove, clear_preselect));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(sub: &str, position: Vec3, keep_preselect: bool) -> String {
        ReplayLine::Add {
            document: "Doc".into(),
            object: "Body".into(),
            sub_name: sub.into(),
            position,
            keep_preselect,
        }
        .to_string()
    }

    #[test]
    fn test_add_line() {
        assert_eq!(add("", Vec3::ZERO, false), r#"selection.add("Doc", "Body")"#);
        assert_eq!(
            add("Edge1", Vec3::ZERO, false),
            r#"selection.add("Doc", "Body", "Edge1")"#
        );
        assert_eq!(
            add("Edge1", Vec3::new(1.0, 2.5, 0.0), false),
            r#"selection.add("Doc", "Body", "Edge1", 1, 2.5, 0)"#
        );
        assert_eq!(
            add("", Vec3::ZERO, true),
            r#"selection.add("Doc", "Body", "", 0, 0, 0, false)"#
        );
    }

    #[test]
    fn test_other_lines() {
        let many = ReplayLine::AddMany {
            document: "Doc".into(),
            object: "Body".into(),
            sub_names: vec!["Edge1".into(), "Face2".into()],
        };
        assert_eq!(
            many.to_string(),
            r#"selection.add("Doc", "Body", ["Edge1", "Face2"])"#
        );

        let remove = ReplayLine::Remove {
            document: "Doc".into(),
            object: "Body".into(),
            sub_name: "Edge1".into(),
        };
        assert_eq!(remove.to_string(), r#"selection.remove("Doc", "Body", "Edge1")"#);

        let clear_all = ReplayLine::Clear {
            document: None,
            keep_preselect: false,
        };
        assert_eq!(clear_all.to_string(), "selection.clear()");

        let clear_doc = ReplayLine::Clear {
            document: Some("Doc".into()),
            keep_preselect: true,
        };
        assert_eq!(clear_doc.to_string(), r#"selection.clear("Doc", false)"#);
    }
}
