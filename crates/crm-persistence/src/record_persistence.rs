use crate::schema;
use crate::schema::records::dsl;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::Error as DieselError;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use record_store::{EntityType, Fields, Filter, Record, RecordId, RecordStore, StoreError};
use std::sync::Arc;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
/// Variable de entorno con la URL de la base de datos (alternativa: `DATABASE_URL`).
pub const ENV_DB_URL: &str = "CRM_DB_URL";
#[cfg(not(feature = "pg"))]
const DEFAULT_SQLITE_URL: &str = "crm.db";

#[cfg(feature = "pg")]
type DbConn = PgConnection;
#[cfg(not(feature = "pg"))]
type DbConn = SqliteConnection;
type DbPool = Pool<ConnectionManager<DbConn>>;

/// `RecordStore` sobre una única tabla `records`. Los ids son globales y
/// crecientes: cada alta calcula `max(id) + 1` con la tabla bloqueada para
/// escritura, de modo que varios procesos o hilos pueden crear a la vez. La
/// búsqueda filtra en memoria los registros de la entidad, ordenados por id.
pub struct DieselRecordStore {
  pool: Arc<DbPool>,
}

impl DieselRecordStore {
  /// Abre el pool contra `database_url` y aplica las migraciones pendientes.
  pub fn new(database_url: &str) -> Result<Self, StoreError> {
    let manager = ConnectionManager::<DbConn>::new(database_url);
    let builder = Pool::builder().max_size(4);
    #[cfg(not(feature = "pg"))]
    let builder = builder.connection_customizer(Box::new(SqlitePragmas));
    let pool = builder.build(manager).map_err(|e| StoreError::Storage(format!("pool: {}", e)))?;
    let store = DieselRecordStore { pool: Arc::new(pool) };
    let mut conn = store.conn()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| StoreError::Storage(format!("migraciones: {}", e)))?;
    log::debug!("crm-persistence: migraciones aplicadas");
    Ok(store)
  }

  fn conn(&self) -> Result<PooledConnection<ConnectionManager<DbConn>>, StoreError> {
    self.pool.get().map_err(|e| StoreError::Storage(format!("pool: {}", e)))
  }
}

#[cfg(not(feature = "pg"))]
#[derive(Debug)]
struct SqlitePragmas;

#[cfg(not(feature = "pg"))]
impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    let _ = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(conn);
    diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(conn)
                                                    .map_err(diesel::r2d2::Error::QueryError)?;
    Ok(())
  }
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::records)]
struct RecordRow {
  pub id: i64,
  pub entity: String,
  pub fields: String,
  pub created_at_ts: i64,
  pub updated_at_ts: i64,
}

impl RecordRow {
  fn into_record(self) -> Result<Record, StoreError> {
    let entity = self.entity.parse::<EntityType>().map_err(StoreError::Storage)?;
    let fields: Fields = serde_json::from_str(&self.fields)?;
    Ok(Record { id: RecordId(self.id),
                entity,
                fields,
                created_at: from_millis(self.created_at_ts)?,
                updated_at: from_millis(self.updated_at_ts)? })
  }
}

fn from_millis(ts: i64) -> Result<DateTime<Utc>, StoreError> {
  DateTime::from_timestamp_millis(ts).ok_or_else(|| StoreError::Storage(format!("timestamp inválido: {}", ts)))
}

fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T, StoreError> {
  res.map_err(|e| StoreError::Storage(format!("db: {}", e)))
}

/// Error dentro de una transacción: Diesel exige `From<DieselError>`.
enum TxError {
  Db(DieselError),
  Store(StoreError),
}

impl From<DieselError> for TxError {
  fn from(e: DieselError) -> Self {
    TxError::Db(e)
  }
}

impl From<TxError> for StoreError {
  fn from(e: TxError) -> Self {
    match e {
      TxError::Db(e) => StoreError::Storage(format!("db: {}", e)),
      TxError::Store(e) => e,
    }
  }
}

/// Inserta la fila con el siguiente id global. Debe ejecutarse con la tabla
/// bloqueada para escritura: ver `allocate_and_insert`.
fn insert_next(conn: &mut DbConn, entity: EntityType, payload: String, now: i64) -> QueryResult<i64> {
  let last: Option<i64> = dsl::records.select(diesel::dsl::max(dsl::id)).first(conn)?;
  let next = last.unwrap_or(0) + 1;
  let row = RecordRow { id: next,
                        entity: entity.store_name().to_string(),
                        fields: payload,
                        created_at_ts: now,
                        updated_at_ts: now };
  diesel::insert_into(dsl::records).values(&row).execute(conn)?;
  Ok(next)
}

/// `BEGIN IMMEDIATE` toma el bloqueo de escritura antes de leer `max(id)`, así
/// dos altas concurrentes no pueden calcular el mismo id.
#[cfg(not(feature = "pg"))]
fn allocate_and_insert(conn: &mut DbConn, entity: EntityType, payload: String, now: i64) -> QueryResult<i64> {
  conn.immediate_transaction(|conn| insert_next(conn, entity, payload, now))
}

/// `SHARE ROW EXCLUSIVE` se excluye a sí mismo: las altas se serializan
/// mientras las lecturas siguen libres.
#[cfg(feature = "pg")]
fn allocate_and_insert(conn: &mut DbConn, entity: EntityType, payload: String, now: i64) -> QueryResult<i64> {
  conn.transaction(|conn| {
        diesel::sql_query("LOCK TABLE records IN SHARE ROW EXCLUSIVE MODE").execute(conn)?;
        insert_next(conn, entity, payload, now)
      })
}

fn raw_ids(ids: &[RecordId]) -> Vec<i64> {
  ids.iter().map(|id| id.get()).collect()
}

impl RecordStore for DieselRecordStore {
  fn search(&self, entity: EntityType, filters: &[Filter]) -> Result<Vec<RecordId>, StoreError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(dsl::records.filter(dsl::entity.eq(entity.store_name()))
                                      .order(dsl::id.asc())
                                      .load::<RecordRow>(&mut conn))?;
    let mut found = Vec::new();
    for row in rows {
      let record = row.into_record()?;
      if record.matches(filters) {
        found.push(record.id);
      }
    }
    log::debug!("search {} {:?}: {} resultado(s)", entity, filters, found.len());
    Ok(found)
  }

  fn read(&self, entity: EntityType, ids: &[RecordId]) -> Result<Vec<Record>, StoreError> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let mut conn = self.conn()?;
    let rows = map_db_err(dsl::records.filter(dsl::entity.eq(entity.store_name()))
                                      .filter(dsl::id.eq_any(raw_ids(ids)))
                                      .load::<RecordRow>(&mut conn))?;
    let records = rows.into_iter().map(RecordRow::into_record).collect::<Result<Vec<_>, _>>()?;
    // Mismo orden que `ids`; los ids repetidos se devuelven repetidos.
    let mut ordered = Vec::with_capacity(ids.len());
    for id in ids {
      let record = records.iter()
                          .find(|r| r.id == *id)
                          .cloned()
                          .ok_or(StoreError::NotFound { entity, id: *id })?;
      ordered.push(record);
    }
    Ok(ordered)
  }

  fn create(&self, entity: EntityType, values: Fields) -> Result<RecordId, StoreError> {
    let mut conn = self.conn()?;
    let payload = serde_json::to_string(&values)?;
    let now = Utc::now().timestamp_millis();
    let id = map_db_err(allocate_and_insert(&mut conn, entity, payload, now))?;
    log::debug!("create {} -> {}", entity, id);
    Ok(RecordId(id))
  }

  fn write(&self, entity: EntityType, ids: &[RecordId], values: Fields) -> Result<bool, StoreError> {
    let mut conn = self.conn()?;
    let now = Utc::now().timestamp_millis();
    // Todo o nada: un id inexistente deshace la transacción.
    conn.transaction::<_, TxError, _>(|conn| {
          let rows = dsl::records.filter(dsl::entity.eq(entity.store_name()))
                                 .filter(dsl::id.eq_any(raw_ids(ids)))
                                 .load::<RecordRow>(conn)?;
          if let Some(missing) = ids.iter().find(|id| !rows.iter().any(|r| r.id == id.get())) {
            return Err(TxError::Store(StoreError::NotFound { entity, id: *missing }));
          }
          if values.is_empty() {
            return Ok(());
          }
          for row in rows {
            let row_id = row.id;
            let mut record = row.into_record().map_err(TxError::Store)?;
            record.merge(&values);
            let payload = serde_json::to_string(&record.fields).map_err(|e| TxError::Store(e.into()))?;
            diesel::update(dsl::records.filter(dsl::id.eq(row_id))).set((dsl::fields.eq(payload),
                                                                         dsl::updated_at_ts.eq(now)))
                                                                   .execute(conn)?;
          }
          Ok(())
        })?;
    log::debug!("write {} {:?}", entity, ids);
    Ok(true)
  }
}

/// Construye el almacén a partir de `CRM_DB_URL` o `DATABASE_URL` (tras
/// cargar `.env`). Sin `pg`, una URL ausente usa el fichero `crm.db`.
#[cfg(feature = "pg")]
pub fn new_from_env() -> Result<DieselRecordStore, StoreError> {
  dotenvy::dotenv().ok();
  let url = std::env::var(ENV_DB_URL).or_else(|_| std::env::var("DATABASE_URL"))
                                     .map_err(|_| StoreError::Storage(format!("{} / DATABASE_URL no definida", ENV_DB_URL)))?;
  if !(url.starts_with("postgres") || url.contains('@')) {
    return Err(StoreError::Storage(format!("{} no parece una URL de Postgres", ENV_DB_URL)));
  }
  log::info!("crm-persistence: usando Postgres");
  DieselRecordStore::new(&url)
}

#[cfg(not(feature = "pg"))]
pub fn new_from_env() -> Result<DieselRecordStore, StoreError> {
  dotenvy::dotenv().ok();
  let url = std::env::var(ENV_DB_URL).or_else(|_| std::env::var("DATABASE_URL"))
                                     .unwrap_or_else(|_| DEFAULT_SQLITE_URL.to_string());
  if url.starts_with("postgres") {
    return Err(StoreError::Storage("crm-persistence se compiló sin la feature 'pg'; actívala para usar Postgres".into()));
  }
  log::info!("crm-persistence: usando SQLite en {}", url);
  DieselRecordStore::new(&url)
}

/// Almacén SQLite sobre una ruta explícita, sin leer el entorno.
#[cfg(not(feature = "pg"))]
pub fn new_sqlite_for_test(path: &str) -> Result<DieselRecordStore, StoreError> {
  DieselRecordStore::new(path)
}
