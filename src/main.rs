use scanforge::app;

fn main() {
    app::startup::startup();
}
