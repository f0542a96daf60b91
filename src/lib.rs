/*!
# T.U.L.O.N.G Admin

Back office for the T.U.L.O.N.G disaster-response registration app, built in Rust.

## Overview

Citizens register through the mobile app; each registration lands as one record
under the `users` node of a realtime JSON document database. This crate is what
the admin dashboard runs on: it pulls that collection in pages, keeps it fresh
with live updates, and turns it into the dashboard's statistics, tables,
exports and printable reports.

## Architecture

### Data Layer
- **store**: The `DocumentStore` contract (full read of a path, live
  subscription) with an in-memory store and a file-backed store that reads a
  JSON (or gzip) export of the database
- **user**: Lenient record model and the derived display values (full name,
  full address, phone with legacy aliases, "N/A" fallbacks)
- **timestamp**: `createdAt` parsing; unknown dates sort last

### Loading Layer
- **loader**: Newest-first paginated view of the collection. The database can
  neither sort nor page, so every read fetches everything and slices locally.
  Reads time out, stale reads are discarded, and live snapshots replace the
  list once at least 90% of it is loaded

### Presentation Layer
- **analytics**: Counting, grouping and growth figures for the dashboard cards,
  the time-based charts and the geographic breakdowns
- **filter**: Search, location filters, sorting and paging of the user table
- **downloader**: CSV, Excel-compatible CSV and XLSX export
- **report**: Printable HTML report
- **app**: JSON API over all of the above (`web` feature)

## Modules

- **analytics**: Aggregations over the materialized list
- **config**: Loader options and environment configuration
- **downloader**: Export functionality (CSV, Excel, XLSX)
- **error**: Store and loader error types
- **filter**: User table querying
- **loader**: Paginated, live-updating user collection
- **report**: HTML report rendering
- **store**: Database access
- **timestamp**: Registration times
- **user**: User records
- **app**: Routing and handlers

## REST API Endpoints

- `GET /api/users` - Current load state
- `POST /api/users/more`, `POST /api/users/refresh` - Pagination controls
- `GET /api/users/table` - Filtered, sorted page of the user table
- `GET /api/analytics/{summary,time,geographic}` - Dashboard figures
- `GET /api/export/{csv,excel,xlsx}` - Downloads of the filtered list
- `GET /api/report` - Printable report
*/

pub mod analytics;
pub mod config;
pub mod downloader;
pub mod error;
pub mod filter;
pub mod loader;
pub mod report;
pub mod store;
pub mod timestamp;
pub mod user;

#[cfg(feature = "web")]
pub mod app;

pub use config::{AdminConfig, LoaderOptions};
pub use error::{LoaderError, StoreError};
pub use loader::{LoadState, PaginatedUsers};
pub use store::{DocumentStore, JsonFileStore, MemoryStore};
pub use timestamp::Timestamp;
pub use user::{UserData, UserRecord};
