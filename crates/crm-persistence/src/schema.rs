// Esquema Diesel del almacén de registros.
// Tabla: records (id global, entidad, campos JSON, timestamps en ms)
diesel::table! {
    records (id) {
        id -> BigInt,
        entity -> Text,
        fields -> Text,
        created_at_ts -> BigInt,
        updated_at_ts -> BigInt,
    }
}
