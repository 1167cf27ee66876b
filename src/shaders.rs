//! WGSL sources for the three render pipelines.
//!
//! The rain shader is generated because the atlas grid is baked in as
//! constants. Scene and skybox shaders are static.

use crate::particles::DropState;

/// Normalized depth that splatting drops are pulled toward the camera.
///
/// Splats sit exactly on `z_ground`, where the ground writes the same depth,
/// so without the lift they lose the `Less` test against it.
pub const SPLAT_DEPTH_LIFT: f32 = 1.0e-5;

/// Rain point-sprite shader for an atlas of `rows` × `cols` cells.
///
/// Instance inputs: `@location(0)` position, `@location(1)` state code
/// (atlas row), `@location(2)` variant (atlas column). Each instance is
/// drawn as six vertices forming a screen-aligned quad of `point_size`
/// pixels.
pub fn rain_shader(rows: u32, cols: u32) -> String {
    let rows = rows.max(1) as f32;
    let cols = cols.max(1) as f32;
    let first_splat = DropState::Impact.code();
    format!(
        r#"const ATLAS_COLS: f32 = {cols:.1};
const ATLAS_ROWS: f32 = {rows:.1};
const FIRST_SPLAT_STATE: u32 = {first_splat}u;
const SPLAT_DEPTH_LIFT: f32 = {SPLAT_DEPTH_LIFT:e};

struct RainUniforms {{
    view_proj: mat4x4<f32>,
    viewport: vec2<f32>,
    point_size: f32,
    _pad: f32,
}};

@group(0) @binding(0)
var<uniform> rain: RainUniforms;

@group(0) @binding(1)
var atlas: texture_2d<f32>;

@group(0) @binding(2)
var atlas_sampler: sampler;

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) state: u32,
    @location(2) variant: u32,
) -> VertexOutput {{
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let corner = quad_vertices[vertex_index];

    // Constant size in pixels regardless of distance.
    var clip_pos = rain.view_proj * vec4<f32>(position, 1.0);
    clip_pos.x += corner.x * rain.point_size / rain.viewport.x * clip_pos.w;
    clip_pos.y += corner.y * rain.point_size / rain.viewport.y * clip_pos.w;
    if state >= FIRST_SPLAT_STATE {{
        clip_pos.z -= SPLAT_DEPTH_LIFT * clip_pos.w;
    }}

    // Sprite-local coordinates with the origin at the top-left corner.
    let point_coord = vec2<f32>(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    let cell = vec2<f32>(1.0 / ATLAS_COLS, 1.0 / ATLAS_ROWS);

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.uv = (vec2<f32>(f32(variant), f32(state)) + point_coord) * cell;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let color = textureSample(atlas, atlas_sampler, in.uv);
    if color.a < 0.1 {{
        discard;
    }}
    return color;
}}
"#
    )
}

/// Phong-lit scene shader with an optional base color texture.
pub const SCENE_SHADER: &str = r#"struct SceneUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    light_pos: vec4<f32>,
    light_color: vec4<f32>,
    ambient: vec4<f32>,
    view_pos: vec4<f32>,
};

struct Material {
    base_color: vec4<f32>,
    has_texture: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};

@group(0) @binding(0)
var<uniform> scene: SceneUniforms;

@group(1) @binding(0)
var<uniform> material: Material;

@group(1) @binding(1)
var base_texture: texture_2d<f32>;

@group(1) @binding(2)
var base_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = scene.model * vec4<f32>(in.position, 1.0);

    var out: VertexOutput;
    out.clip_position = scene.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (scene.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(base_texture, base_sampler, in.uv);
    var color = material.base_color;
    if material.has_texture != 0u {
        color = color * texel;
    }

    let n = normalize(in.normal);
    let to_light = normalize(scene.light_pos.xyz - in.world_pos);
    let to_eye = normalize(scene.view_pos.xyz - in.world_pos);

    let diffuse = max(dot(n, to_light), 0.0);
    let reflected = reflect(-to_light, n);
    let specular = pow(max(dot(to_eye, reflected), 0.0), 32.0) * 0.3;

    let light = scene.light_color.rgb;
    let lighting = scene.ambient.rgb + diffuse * light + specular * light;
    return vec4<f32>(color.rgb * lighting, color.a);
}
"#;

/// Cubemap skybox drawn at the far plane.
pub const SKYBOX_SHADER: &str = r#"struct SkyUniforms {
    view_proj: mat4x4<f32>,
    exposure: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0)
var<uniform> sky: SkyUniforms;

@group(0) @binding(1)
var sky_texture: texture_cube<f32>;

@group(0) @binding(2)
var sky_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    let clip = sky.view_proj * vec4<f32>(position, 1.0);

    var out: VertexOutput;
    // z = w puts every fragment on the far plane.
    out.clip_position = clip.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(sky_texture, sky_sampler, in.direction);
    return vec4<f32>(color.rgb * sky.exposure, 1.0);
}
"#;
