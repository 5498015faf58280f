//! shard and region expansion
//!
//! A legacy `replication_specs` block describes `num_shards` identical shards. The advanced cluster lists every
//! shard separately, so each spec is expanded:
//! - a literal count `n` becomes `n` copies of the spec object
//! - a symbolic count becomes `[for i in range(<count>) : <spec object>]`
//!
//! Region configs of a spec are listed in descending priority.
use crate::error::Issue;
use crate::literal;
use crate::schema::NUM_SHARDS;
use crate::tokens::{expr_text, ObjectTokens, Tokens};
use hcl_edit::expr::Expression;

#[derive(Debug, Clone, PartialEq)]
pub enum ShardCount {
    Literal(i64),
    Symbolic(String),
}

impl ShardCount {
    /// Classifies a `num_shards` expression, absent means a single shard
    pub fn classify(expr: Option<&Expression>) -> Result<Self, Issue> {
        let Some(expr) = expr else {
            return Ok(ShardCount::Literal(1));
        };

        match literal::integer(expr) {
            Some(value) if value < 1 => Err(Issue::NonPositiveCount {
                name: NUM_SHARDS,
                value,
            }),
            Some(value) => Ok(ShardCount::Literal(value)),
            None => Ok(ShardCount::Symbolic(expr_text(expr))),
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, ShardCount::Symbolic(_))
    }
}

/// One replication spec and how many shards it stands for
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Shard {
    pub count: ShardCount,
    pub spec: ObjectTokens,
}

impl Shard {
    /// The shards of this spec as an array expression
    pub fn expand(self) -> Tokens {
        match self.count {
            ShardCount::Literal(count) => Tokens::array(duplicate(self.spec, count)),
            ShardCount::Symbolic(count) => {
                Tokens::for_array(format!("i in range({count})"), Tokens::Object(self.spec))
            }
        }
    }
}

/// All shards of a resource as a single array expression
///
/// Specs with a symbolic count cannot be duplicated, so as soon as one is present every spec is expanded on its
/// own and the arrays are joined with `concat`.
pub fn expand_shards(shards: Vec<Shard>) -> Tokens {
    if shards.iter().any(|shard| shard.count.is_symbolic()) {
        tracing::trace!(specs = shards.len(), "expanding symbolic shards");
        return Tokens::concat(shards.into_iter().map(Shard::expand).collect());
    }

    Tokens::array(shards.into_iter().flat_map(|shard| match shard.count {
        ShardCount::Literal(count) => duplicate(shard.spec, count),
        ShardCount::Symbolic(_) => vec![shard.spec],
    }))
}

fn duplicate(spec: ObjectTokens, count: i64) -> Vec<ObjectTokens> {
    let count = usize::try_from(count).unwrap_or(0);
    vec![spec; count]
}

/// A region config and its literal priority, if it has one
#[derive(Debug, Clone, derive_new::new)]
pub struct RegionConfig {
    pub priority: Option<i64>,
    pub config: ObjectTokens,
}

/// Orders region configs by descending priority
///
/// When any priority is symbolic the order can't be known, and the source order is kept.
pub fn sort_by_priority(mut configs: Vec<RegionConfig>) -> Vec<ObjectTokens> {
    if configs.iter().all(|config| config.priority.is_some()) {
        configs.sort_by(|a, b| b.priority.cmp(&a.priority));
    }
    configs.into_iter().map(|config| config.config).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn count(expr: &str) -> Result<ShardCount, Issue> {
        ShardCount::classify(Some(&expr.parse().expect("expression must parse")))
    }

    fn spec(zone: &str) -> ObjectTokens {
        ObjectTokens::new().with("zone_name", Tokens::raw(format!("\"{zone}\"")))
    }

    #[test]
    fn classify_counts() {
        assert_eq!(ShardCount::classify(None), Ok(ShardCount::Literal(1)));
        assert_eq!(count("3"), Ok(ShardCount::Literal(3)));
        assert_eq!(count("var.n"), Ok(ShardCount::Symbolic("var.n".into())));
        assert_eq!(
            count("0"),
            Err(Issue::NonPositiveCount {
                name: "num_shards",
                value: 0
            })
        );
    }

    #[test]
    fn literal_counts_are_duplicated() {
        let tokens = expand_shards(vec![Shard::new(ShardCount::Literal(3), spec("a"))]);

        assert_eq!(tokens, Tokens::array(vec![spec("a"), spec("a"), spec("a")]));
    }

    #[test]
    fn literal_specs_share_one_array() {
        let tokens = expand_shards(vec![
            Shard::new(ShardCount::Literal(2), spec("a")),
            Shard::new(ShardCount::Literal(1), spec("b")),
        ]);

        assert_eq!(tokens, Tokens::array(vec![spec("a"), spec("a"), spec("b")]));
    }

    #[test]
    fn symbolic_counts_use_comprehensions() {
        let tokens = expand_shards(vec![Shard::new(
            ShardCount::Symbolic("var.n".into()),
            spec("a"),
        )]);

        assert_eq!(
            tokens.render(0),
            "[\n  for i in range(var.n) : {\n    zone_name = \"a\"\n  }\n]"
        );
    }

    #[test]
    fn symbolic_counts_concat_all_specs() {
        let tokens = expand_shards(vec![
            Shard::new(ShardCount::Literal(1), spec("a")),
            Shard::new(ShardCount::Symbolic("var.n".into()), spec("b")),
        ]);

        let Tokens::Call(name, args) = tokens else {
            panic!("expected a function call");
        };
        assert_eq!(name, "concat");
        assert_eq!(args[0], Tokens::array_single(spec("a")));
        assert!(matches!(args[1], Tokens::For { .. }));
    }

    fn region(priority: i64) -> ObjectTokens {
        ObjectTokens::new().with("priority", Tokens::raw(priority.to_string()))
    }

    #[test]
    fn literal_priorities_are_sorted_descending() {
        let sorted = sort_by_priority(vec![
            RegionConfig::new(Some(3), region(3)),
            RegionConfig::new(Some(7), region(7)),
            RegionConfig::new(Some(5), region(5)),
        ]);

        assert_eq!(sorted, vec![region(7), region(5), region(3)]);
    }

    #[test]
    fn symbolic_priorities_keep_source_order() {
        let symbolic = ObjectTokens::new().with("priority", Tokens::raw("var.priority"));
        let sorted = sort_by_priority(vec![
            RegionConfig::new(Some(3), region(3)),
            RegionConfig::new(None, symbolic.clone()),
            RegionConfig::new(Some(7), region(7)),
        ]);

        assert_eq!(sorted, vec![region(3), symbolic, region(7)]);
    }
}
