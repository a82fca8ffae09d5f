mod adapters;
mod intent;
