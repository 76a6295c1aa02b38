pub mod log_file;
pub mod mail;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutMode {
    #[default]
    Smtp,
    Stdout,
}
