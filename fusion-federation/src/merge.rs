//! The unified schema merger: composes per-subgraph schemas into one
//! multiplexed schema, rewriting any federated subgraph into stitchable form
//! first (§4.4).

use std::sync::Arc;

use apollo_compiler::Schema;
use fusion_runtime::Executor;
use fusion_runtime::SubgraphName;
use indexmap::IndexMap;

use crate::detect::is_federated;
use crate::error::AggregateMergeError;
use crate::error::MergeError;
use crate::link::links_federation_spec;
use crate::resolvers::ResolverMap;
use crate::sdl_fetch::fetch_sdl;
use crate::translate::TranslationCache;

/// One subgraph as handed to the merger: its current schema, the executor
/// the merger may use to fetch its SDL, and whatever local resolvers the
/// host attached to its fields.
pub struct SubgraphInput {
    pub name: SubgraphName,
    pub schema: Schema,
    pub executor: Arc<dyn Executor>,
    pub resolvers: ResolverMap,
    /// Opts this subgraph out of the stitcher's default batching (§4.4
    /// "Stitching"). Most subgraphs leave this `false`.
    pub batching_disabled: bool,
}

/// Stitcher-wide knobs (§4.4 "Stitching").
///
/// Deserializable with the same `#[serde(default)]`-per-field convention
/// `fusion_runtime::RuntimeConfig` uses, so a host can fold this into its
/// own configuration tree next to the runtime's tunables.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StitchConfig {
    /// Default batching enabled-ness, overridable per subgraph via
    /// [`SubgraphInput::batching_disabled`].
    pub default_batching: bool,
    /// Type-merging validation is disabled by default: the upstream is
    /// trusted (§4.4 "Stitching"). Flipping this on tightens the root-field
    /// collision check in [`merge_subgraphs`] from warn-worthy to fatal —
    /// exposed for host-side testing, not expected to be used in production.
    pub type_merging_validation: bool,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            default_batching: true,
            type_merging_validation: false,
        }
    }
}

/// One subgraph's contribution to the unified schema, after any federation
/// rewrite has been applied.
#[derive(Clone)]
pub struct Subschema {
    pub name: SubgraphName,
    pub schema: Arc<Schema>,
    pub resolvers: ResolverMap,
    pub batching_enabled: bool,
    pub was_federated: bool,
}

/// The result of a successful merge: every subgraph's transformed
/// subschema, keyed so callers can recover the post-stitching schema for
/// any original subgraph (§4.4 "Source map").
pub struct UnifiedSchema {
    subschemas: IndexMap<SubgraphName, Subschema>,
}

impl UnifiedSchema {
    pub fn subschema(&self, name: &SubgraphName) -> Option<&Subschema> {
        self.subschemas.get(name)
    }

    pub fn source_map(&self) -> &IndexMap<SubgraphName, Subschema> {
        &self.subschemas
    }

    pub fn len(&self) -> usize {
        self.subschemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subschemas.is_empty()
    }
}

/// Composes `subgraphs` into a [`UnifiedSchema`].
///
/// SDL fetches for every federated subgraph run concurrently; every
/// per-subgraph failure (fetch, malformed response, unparsable rewrite) is
/// collected rather than returned on the first one, so a host fixing a
/// broken composition sees every problem in one pass. A root-field
/// collision found while assembling the source map is a single stitch-time
/// failure and aborts immediately, since it isn't a per-subgraph concern.
pub async fn merge_subgraphs(
    subgraphs: Vec<SubgraphInput>,
    cache: &TranslationCache,
    config: &StitchConfig,
) -> Result<UnifiedSchema, AggregateMergeError> {
    let rewritten = futures::future::join_all(
        subgraphs
            .into_iter()
            .map(|input| rewrite_one(input, cache, config)),
    )
    .await;

    let mut subschemas = IndexMap::new();
    let mut errors = Vec::new();
    for result in rewritten {
        match result {
            Ok(subschema) => {
                subschemas.insert(subschema.name.clone(), subschema);
            }
            Err(err) => errors.push(err),
        }
    }
    if !errors.is_empty() {
        return Err(AggregateMergeError(errors));
    }

    if let Err(err) = check_root_field_collisions(&subschemas, config.type_merging_validation) {
        return Err(AggregateMergeError(vec![err]));
    }

    Ok(UnifiedSchema { subschemas })
}

async fn rewrite_one(
    input: SubgraphInput,
    cache: &TranslationCache,
    config: &StitchConfig,
) -> Result<Subschema, MergeError> {
    let subgraph_name = input.name.as_str().to_string();

    if !is_federated(&input.schema) {
        return Ok(Subschema {
            name: input.name,
            schema: Arc::new(input.schema),
            resolvers: input.resolvers,
            batching_enabled: config.default_batching && !input.batching_disabled,
            was_federated: false,
        });
    }

    let sdl = if links_federation_spec(&input.schema) {
        input.schema.to_string()
    } else {
        fetch_sdl(input.executor.as_ref(), &subgraph_name).await?
    };

    let translated = cache.translate(&subgraph_name, &sdl)?;
    let rewritten_schema =
        Schema::parse(translated.as_ref(), "subgraph.graphql").map_err(|err| MergeError::Unparsable {
            subgraph_name: subgraph_name.clone(),
            source: err.to_string().into(),
        })?;

    let resolvers = input.resolvers.reattach(&subgraph_name, &rewritten_schema);

    Ok(Subschema {
        name: input.name,
        schema: Arc::new(rewritten_schema),
        resolvers,
        batching_enabled: config.default_batching && !input.batching_disabled,
        was_federated: true,
    })
}

/// A deliberately shallow stitch-time check: the full type-merging
/// validation the spec disables by default would compare field types and
/// `@merge` keys across subschemas; this just catches the one conflict that
/// can't be trusted to the upstream — two subgraphs both claiming ownership
/// of the same root field with no merge relationship between them.
///
/// With `type_merging_validation` off (the default), a collision is only
/// `tracing::warn!`-ed, trusting the upstream the way the rest of the
/// stitcher does; with it on, the same collision is fatal.
fn check_root_field_collisions(
    subschemas: &IndexMap<SubgraphName, Subschema>,
    type_merging_validation: bool,
) -> Result<(), MergeError> {
    use apollo_compiler::schema::ExtendedType;
    use std::collections::HashMap;

    let mut owners: HashMap<(&str, &str), &SubgraphName> = HashMap::new();
    for subschema in subschemas.values() {
        let Some(query_type_name_ref) = subschema.schema.schema_definition.query.as_ref() else {
            continue;
        };
        let query_type_name: &str = query_type_name_ref.as_ref();
        let Some(ExtendedType::Object(query_type)) = subschema.schema.types.get(query_type_name) else {
            continue;
        };
        for field_name in query_type.fields.keys() {
            let field_name: &str = field_name.as_str();
            if field_name == "_service" {
                continue;
            }
            match owners.get(&(query_type_name, field_name)) {
                Some(other) if **other != subschema.name => {
                    if type_merging_validation {
                        return Err(MergeError::Stitch {
                            source: format!(
                                "root field {query_type_name}.{field_name} is defined by both \
                                 {other} and {}",
                                subschema.name
                            )
                            .into(),
                        });
                    }
                    tracing::warn!(
                        %query_type_name,
                        %field_name,
                        owner = %other,
                        other_owner = %subschema.name,
                        "root field defined by more than one subgraph"
                    );
                }
                _ => {
                    owners.insert((query_type_name, field_name), &subschema.name);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::federation;
    use async_trait::async_trait;
    use fusion_runtime::ExecutionRequest;
    use fusion_runtime::ExecutionResult;
    use fusion_runtime::ExecutionSingleResult;
    use tower::BoxError;

    struct FakeExecutor {
        sdl: &'static str,
    }

    #[async_trait]
    impl Executor for FakeExecutor {
        async fn execute(&self, _request: ExecutionRequest) -> Result<ExecutionResult, BoxError> {
            Ok(ExecutionResult::single(ExecutionSingleResult::from_data(
                serde_json_bytes::json!({ "_service": { "sdl": self.sdl } }),
            )))
        }
    }

    fn parse(sdl: &str) -> Schema {
        Schema::parse(sdl, "test.graphql").unwrap_or_else(|err| err.partial)
    }

    #[tokio::test]
    async fn a_non_federated_subgraph_passes_through_unchanged() {
        let input = SubgraphInput {
            name: SubgraphName::new("local"),
            schema: parse("type Query { x: Int }"),
            executor: Arc::new(FakeExecutor { sdl: "" }),
            resolvers: ResolverMap::default(),
            batching_disabled: false,
        };
        let unified = merge_subgraphs(vec![input], &TranslationCache::new(), &StitchConfig::default())
            .await
            .unwrap();
        let subschema = unified.subschema(&SubgraphName::new("local")).unwrap();
        assert!(!subschema.was_federated);
        assert!(subschema.schema.types.contains_key("Query"));
    }

    #[tokio::test]
    async fn a_federated_subgraph_is_fetched_translated_and_rewritten() {
        let sdl = format!(
            "directive @{key}(fields: String!) repeatable on OBJECT\n\
             type Query {{ _service: _Service! product(id: ID!): Product }}\n\
             type _Service {{ sdl: String }}\n\
             type Product @{key}(fields: \"id\") {{ id: ID! }}",
            key = federation::KEY
        );
        let input = SubgraphInput {
            name: SubgraphName::new("products"),
            schema: parse("type Query { _service: _Service! } type _Service { sdl: String }"),
            executor: Arc::new(FakeExecutor {
                sdl: Box::leak(sdl.into_boxed_str()),
            }),
            resolvers: ResolverMap::default(),
            batching_disabled: false,
        };
        let unified = merge_subgraphs(vec![input], &TranslationCache::new(), &StitchConfig::default())
            .await
            .unwrap();
        let subschema = unified.subschema(&SubgraphName::new("products")).unwrap();
        assert!(subschema.was_federated);
        assert!(subschema.schema.to_string().contains("@merge"));
    }

    #[tokio::test]
    async fn sdl_fetch_failures_aggregate_across_subgraphs() {
        struct FailingExecutor;

        #[async_trait]
        impl Executor for FailingExecutor {
            async fn execute(
                &self,
                _request: ExecutionRequest,
            ) -> Result<ExecutionResult, BoxError> {
                Err("connection refused".into())
            }
        }

        let federated_schema = || {
            parse("type Query { _service: _Service! } type _Service { sdl: String }")
        };
        let a = SubgraphInput {
            name: SubgraphName::new("a"),
            schema: federated_schema(),
            executor: Arc::new(FailingExecutor),
            resolvers: ResolverMap::default(),
            batching_disabled: false,
        };
        let b = SubgraphInput {
            name: SubgraphName::new("b"),
            schema: federated_schema(),
            executor: Arc::new(FailingExecutor),
            resolvers: ResolverMap::default(),
            batching_disabled: false,
        };
        let err = merge_subgraphs(vec![a, b], &TranslationCache::new(), &StitchConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.0.len(), 2);
    }

    #[tokio::test]
    async fn colliding_root_fields_are_tolerated_by_default() {
        let a = SubgraphInput {
            name: SubgraphName::new("a"),
            schema: parse("type Query { shared: Int }"),
            executor: Arc::new(FakeExecutor { sdl: "" }),
            resolvers: ResolverMap::default(),
            batching_disabled: false,
        };
        let b = SubgraphInput {
            name: SubgraphName::new("b"),
            schema: parse("type Query { shared: Int }"),
            executor: Arc::new(FakeExecutor { sdl: "" }),
            resolvers: ResolverMap::default(),
            batching_disabled: false,
        };
        let unified = merge_subgraphs(vec![a, b], &TranslationCache::new(), &StitchConfig::default())
            .await
            .unwrap();
        assert_eq!(unified.len(), 2);
    }

    #[tokio::test]
    async fn colliding_root_fields_abort_the_merge_with_type_merging_validation_on() {
        let a = SubgraphInput {
            name: SubgraphName::new("a"),
            schema: parse("type Query { shared: Int }"),
            executor: Arc::new(FakeExecutor { sdl: "" }),
            resolvers: ResolverMap::default(),
            batching_disabled: false,
        };
        let b = SubgraphInput {
            name: SubgraphName::new("b"),
            schema: parse("type Query { shared: Int }"),
            executor: Arc::new(FakeExecutor { sdl: "" }),
            resolvers: ResolverMap::default(),
            batching_disabled: false,
        };
        let config = StitchConfig {
            type_merging_validation: true,
            ..StitchConfig::default()
        };
        let err = merge_subgraphs(vec![a, b], &TranslationCache::new(), &config)
            .await
            .unwrap_err();
        assert_eq!(err.0.len(), 1);
        assert!(matches!(err.0[0], MergeError::Stitch { .. }));
    }
}
