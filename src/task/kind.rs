use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_task_kinds {
    ( $( ($variant:ident, $wire:expr) ),* $(,)? ) => {
        /// The `type` of a workflow task.
        ///
        /// The set is open: anything the execution engine sends that is not one of
        /// the known kinds is kept verbatim in [`TaskKind::Other`].
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum TaskKind {
            $( $variant, )*
            Other(String),
        }

        impl TaskKind {
            /// The wire name of this kind, as the execution engine spells it.
            pub fn as_str(&self) -> &str {
                match self {
                    $( TaskKind::$variant => $wire, )*
                    TaskKind::Other(name) => name,
                }
            }

            /// All kinds this crate knows by name.
            pub fn known() -> &'static [TaskKind] {
                &[ $( TaskKind::$variant, )* ]
            }
        }

        impl From<&str> for TaskKind {
            fn from(value: &str) -> Self {
                match value {
                    $( $wire => TaskKind::$variant, )*
                    other => TaskKind::Other(other.to_string()),
                }
            }
        }
    };
}

define_task_kinds! {
    (Simple, "SIMPLE"),
    (Human, "HUMAN"),
    (Dynamic, "DYNAMIC"),
    (ForkJoin, "FORK_JOIN"),
    (ForkJoinDynamic, "FORK_JOIN_DYNAMIC"),
    (Decision, "DECISION"),
    (Switch, "SWITCH"),
    (Join, "JOIN"),
    (ExclusiveJoin, "EXCLUSIVE_JOIN"),
    (DoWhile, "DO_WHILE"),
    (SubWorkflow, "SUB_WORKFLOW"),
    (Event, "EVENT"),
    (Wait, "WAIT"),
    (Http, "HTTP"),
    (Lambda, "LAMBDA"),
    (Inline, "INLINE"),
    (Terminate, "TERMINATE"),
    (KafkaPublish, "KAFKA_PUBLISH"),
    (JsonJqTransform, "JSON_JQ_TRANSFORM"),
    (SetVariable, "SET_VARIABLE"),
}

impl Default for TaskKind {
    fn default() -> Self {
        TaskKind::Simple
    }
}

impl From<String> for TaskKind {
    fn from(value: String) -> Self {
        match TaskKind::from(value.as_str()) {
            TaskKind::Other(_) => TaskKind::Other(value),
            known => known,
        }
    }
}

impl From<TaskKind> for String {
    fn from(kind: TaskKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
