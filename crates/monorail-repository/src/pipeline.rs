use std::collections::BTreeMap;

/// A single pipeline entry for a script. A sibling directive (`cmd`)
/// sequences scripts within one package; a cascade directive (`^cmd`)
/// propagates the requirement to every workspace dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub command: String,
    pub cascade: bool,
}

/// Compiled pipeline: per-script directive lists. Scripts whose raw token
/// lists reduce to nothing are omitted entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    scripts: BTreeMap<String, Vec<Directive>>,
}

impl Pipeline {
    pub fn compile(raw: &BTreeMap<String, Vec<String>>) -> Self {
        let mut scripts = BTreeMap::new();
        for (script, tokens) in raw {
            let directives: Vec<Directive> = tokens
                .iter()
                .filter(|token| !token.is_empty())
                .map(|token| match token.strip_prefix('^') {
                    Some(command) => Directive {
                        command: command.to_string(),
                        cascade: true,
                    },
                    None => Directive {
                        command: token.clone(),
                        cascade: false,
                    },
                })
                .collect();
            if !directives.is_empty() {
                scripts.insert(script.clone(), directives);
            }
        }
        Pipeline { scripts }
    }

    pub fn directives(&self, script: &str) -> Option<&[Directive]> {
        self.scripts.get(script).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
