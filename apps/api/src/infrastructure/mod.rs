// Infrastructure layer module
// Database adapters: connection pool, migrations, repositories, sample data

pub mod database;
pub mod repositories;
pub mod seed;
