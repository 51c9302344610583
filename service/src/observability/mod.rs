pub mod propagators;
