/// Trait for aggregate roots
///
/// Instance accessors plus the static naming used for tables, storage keys
/// and log messages.
pub trait AggregateRoot {
    /// Aggregate identifier type
    type Id;

    fn id(&self) -> Self::Id;

    /// Aggregate index in the system (e.g. "a006")
    fn aggregate_index() -> &'static str;

    /// Collection name (e.g. "load")
    fn collection_name() -> &'static str;

    /// Singular UI name (e.g. "Carregamento")
    fn element_name() -> &'static str;

    /// Plural UI name (e.g. "Carregamentos")
    fn list_name() -> &'static str;

    /// Full system name (e.g. "a006_load"), also the table name
    fn full_name() -> String {
        format!("{}_{}", Self::aggregate_index(), Self::collection_name())
    }
}
