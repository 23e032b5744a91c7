pub mod vs {
    vulkano_shaders::shader! {
        ty: "vertex",
        path: "src/render/shaders/panel.vert",
    }
}

pub mod fs {
    vulkano_shaders::shader! {
        ty: "fragment",
        path: "src/render/shaders/panel.frag",
    }
}
