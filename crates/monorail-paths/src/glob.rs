use std::{collections::VecDeque, path::Path};

/// Reports whether `path` matches the glob `pattern`. Patterns always use
/// forward slashes as separators while paths use the host separator.
/// Segments between separators are matched with shell-style wildcards
/// (`*`, `?`, character classes); a segment consisting of exactly `**`
/// matches any number of path segments, including zero.
///
/// Segments between globstars are not matched individually: once two or
/// more `**` are in play, everything in the middle is absorbed.
pub fn match_glob(path: &Path, pattern: &str) -> bool {
    let Some(mut set) = ReduceSet::new(path, pattern) else {
        return false;
    };
    let mut matched = set.reduce(End::Front);
    if matched && !set.done() {
        matched = set.reduce(End::Back);
    }
    matched && set.done()
}

/// Reports whether `path` could be a prefix of some full match of
/// `pattern`. This only consumes from the left, and is satisfied as soon
/// as a `**` is reached or the path runs out. Used to decide whether a
/// directory subtree can be pruned while walking.
pub fn match_glob_partial(path: &Path, pattern: &str) -> bool {
    let Some(mut set) = ReduceSet::new(path, pattern) else {
        return false;
    };
    set.reduce(End::Front)
}

#[derive(Clone, Copy)]
enum End {
    Front,
    Back,
}

/// The remaining unmatched middle of a path/pattern pair, reduced pairwise
/// from either end.
struct ReduceSet<'a> {
    segments: VecDeque<&'a str>,
    globs: VecDeque<&'a str>,
    globstars: usize,
}

impl<'a> ReduceSet<'a> {
    /// Returns `None` when the path has a segment that is not valid UTF-8,
    /// which can never match a pattern.
    fn new(path: &'a Path, pattern: &'a str) -> Option<Self> {
        let mut segments = VecDeque::new();
        for component in path.components() {
            segments.push_back(component.as_os_str().to_str()?);
        }
        let globs = if pattern.is_empty() {
            VecDeque::new()
        } else {
            pattern.split('/').collect()
        };
        Some(Self {
            segments,
            globs,
            globstars: 0,
        })
    }

    /// The reduction is finished when both sides are empty, when a single
    /// globstar is left to absorb whatever path remains, or when two or
    /// more globstars swallow the middle.
    fn done(&self) -> bool {
        (self.segments.is_empty() && self.globs.is_empty())
            || (self.globstars == 1 && self.globs.is_empty())
            || self.globstars > 1
    }

    /// Consumes glob/segment pairs from one end until a mismatch, a
    /// globstar, or either side runs out. Returns false only on mismatch.
    fn reduce(&mut self, end: End) -> bool {
        let mut matched = true;
        while matched && !self.segments.is_empty() {
            let Some(glob) = self.pop_glob(end) else {
                break;
            };
            if glob == "**" {
                self.globstars += 1;
                break;
            }
            let Some(segment) = self.pop_segment(end) else {
                break;
            };
            matched = segment_match(glob, segment);
        }
        matched
    }

    fn pop_glob(&mut self, end: End) -> Option<&'a str> {
        match end {
            End::Front => self.globs.pop_front(),
            End::Back => self.globs.pop_back(),
        }
    }

    fn pop_segment(&mut self, end: End) -> Option<&'a str> {
        match end {
            End::Front => self.segments.pop_front(),
            End::Back => self.segments.pop_back(),
        }
    }
}

/// Shell-style wildcard match of a single segment: `*` matches any run of
/// characters, `?` matches one character, `[a-z]` / `[!a-z]` / `[^a-z]`
/// match character classes. There are no separators inside a segment, so
/// `*` never crosses one.
fn segment_match(pattern: &str, segment: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let segment: Vec<char> = segment.chars().collect();
    let (mut p, mut s) = (0, 0);
    // Position to resume from after the most recent `*` on mismatch.
    let mut resume: Option<(usize, usize)> = None;

    loop {
        if s == segment.len() {
            // Segment exhausted: any leftover pattern must be all stars.
            while pattern.get(p) == Some(&'*') {
                p += 1;
            }
            return p == pattern.len();
        }
        let step = match pattern.get(p).copied() {
            Some('*') => {
                resume = Some((p + 1, s));
                p += 1;
                true
            }
            Some('?') => {
                p += 1;
                s += 1;
                true
            }
            Some('[') => match class_match(&pattern[p..], segment[s]) {
                Some(consumed) => {
                    p += consumed;
                    s += 1;
                    true
                }
                None => false,
            },
            Some(literal) => {
                if literal == segment[s] {
                    p += 1;
                    s += 1;
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        if step {
            continue;
        }
        // Mismatch: widen the most recent star by one character, or fail.
        match resume {
            Some((after_star, eaten)) if eaten < segment.len() => {
                resume = Some((after_star, eaten + 1));
                p = after_star;
                s = eaten + 1;
            }
            _ => return false,
        }
    }
}

/// Matches `ch` against the character class starting at `pattern[0]`
/// (which is `[`). Returns the number of pattern characters the class
/// spans when the class is well formed and `ch` is accepted; `None` on a
/// mismatch or an unterminated class.
fn class_match(pattern: &[char], ch: char) -> Option<usize> {
    let negated = matches!(pattern.get(1).copied(), Some('!' | '^'));
    let mut i = if negated { 2 } else { 1 };
    let mut matched = false;
    let mut first = true;
    loop {
        let lo = *pattern.get(i)?;
        if lo == ']' && !first {
            i += 1;
            break;
        }
        first = false;
        match (pattern.get(i + 1).copied(), pattern.get(i + 2).copied()) {
            (Some('-'), Some(hi)) if hi != ']' => {
                if lo <= ch && ch <= hi {
                    matched = true;
                }
                i += 3;
            }
            _ => {
                if lo == ch {
                    matched = true;
                }
                i += 1;
            }
        }
    }
    (matched != negated).then_some(i)
}
