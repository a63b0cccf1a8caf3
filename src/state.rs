use crate::{
    config::JwtConfig,
    db::{DbPool, OrmConn, orm_from_pool},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub jwt: JwtConfig,
}

impl AppState {
    pub fn new(pool: DbPool, jwt: JwtConfig) -> Self {
        let orm = orm_from_pool(&pool);
        Self { pool, orm, jwt }
    }
}
